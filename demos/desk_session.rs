//! Generate the desk-session preset and print each minute's label and hottest cell

use pointerflow::SimulationConfig;

fn main() {
    let config = SimulationConfig::desk_session().with_seed(42);
    let driver = match config.driver() {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return;
        }
    };

    for frame in driver.generate(config.seed) {
        let hottest = frame
            .heatmap
            .as_slice()
            .iter()
            .position(|v| *v == 1.0)
            .map(|idx| (idx % frame.heatmap.cols(), idx / frame.heatmap.cols()));
        println!(
            "Minute {}: {} (cells {}, hottest {:?})",
            frame.minute,
            frame.label,
            frame.heatmap.occupied_cells(),
            hottest
        );
    }
}
