use grid_agent::simulation::StepObserver;
use grid_agent::{GridSnapshot, Outcome, Simulation, SimulationConfig};
use rand::{rngs::StdRng, SeedableRng};
use std::{env, fs, thread, time::Duration};

// Runs a rocket from its launch row through a cloudy sky to the moon and prints every frame.
// The launch row is printed first, so the moon sits on the bottom edge.
// An optional first argument names a TOML file overriding the defaults, e.g.
//
// width = 20
// height = 12
// obstacle_count = 40
// planner = "greedy"
// seed = 3

struct TerminalObserver {
    delay: Duration,
}

impl TerminalObserver {
    fn draw(&self, snapshot: &GridSnapshot) {
        // Clear the screen and move the cursor home
        print!("\x1b[2J\x1b[H{}", snapshot);
    }
}

impl StepObserver for TerminalObserver {
    fn on_start(&mut self, snapshot: &GridSnapshot) {
        self.draw(snapshot);
    }
    fn on_step(&mut self, _step: usize, snapshot: &GridSnapshot) {
        self.draw(snapshot);
        thread::sleep(self.delay);
    }
    fn on_finish(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::GoalReached { steps } => println!("Reached the goal in {} steps", steps),
            Outcome::BudgetExhausted { steps } => {
                println!("Did not reach the goal within {} steps", steps)
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = match env::args().nth(1) {
        Some(path) => SimulationConfig::from_toml_str(&fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut simulation = Simulation::from_config(&config, &mut rng)?;
    let mut observer = TerminalObserver {
        delay: Duration::from_millis(config.step_delay_ms),
    };
    simulation.run(&mut observer)?;
    Ok(())
}
