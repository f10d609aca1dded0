use clap::{Parser, ValueEnum};
use rand::Rng;

use formicarium::simulation::{
    Command, SimulationParams, SimulationWorld, SpeedFactor, CELL_SIZE,
};

/// Grid dimensions selectable at startup
#[derive(Clone, Copy, Debug, ValueEnum)]
enum MapSize {
    Small,
    Medium,
    Large,
}

impl MapSize {
    fn dimensions(&self) -> (usize, usize) {
        match self {
            MapSize::Small => (48, 64),
            MapSize::Medium => (72, 96),
            MapSize::Large => (96, 128),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "formicarium")]
#[command(about = "Headless underground ant-colony simulation")]
struct Args {
    /// Map size preset
    #[arg(short, long, value_enum, default_value = "medium")]
    map: MapSize,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "20000")]
    ticks: u64,

    /// Tick-rate multiplier (1, 2, 4 or 8)
    #[arg(long, default_value = "1")]
    speed: u32,

    /// Drop a food source on the surface every N ticks (0 disables)
    #[arg(long, default_value = "600")]
    food_every: u64,

    /// Food units per dropped source
    #[arg(long, default_value = "4")]
    food_amount: u32,

    /// Print a progress line every N ticks (0 disables)
    #[arg(long, default_value = "1000")]
    report_every: u64,

    /// Export the final snapshot as JSON to this path
    #[arg(long)]
    export: Option<String>,
}

fn main() {
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let (cols, rows) = args.map.dimensions();

    println!(
        "Simulating a {}x{} nest with seed {}",
        cols, rows, seed
    );

    let mut world = SimulationWorld::new(cols, rows, seed, SimulationParams::default());
    world.push_command(Command::SetSpeed(SpeedFactor::from_u32(args.speed)));

    let dt = 1.0 / 30.0;
    let mut rng = rand::thread_rng();
    for _ in 0..args.ticks {
        // Stand in for the click-to-place-food UI with periodic drops
        if args.food_every > 0
            && world.tick_count % args.food_every == 0
            && world.tick_count > 0
        {
            let col = rng.gen_range(2..cols as i32 - 2);
            let x = (col as f32 + 0.5) * CELL_SIZE;
            let y = (world.grid.surface_row as f32 + 0.5) * CELL_SIZE;
            world.push_command(Command::PlaceFood {
                x,
                y,
                amount: args.food_amount,
            });
        }

        world.tick(dt);

        if args.report_every > 0 && world.tick_count % args.report_every == 0 {
            println!(
                "tick {}: founder {:?}, {} workers, {:.1} food, {} deliveries, {} cells dug",
                world.tick_count,
                world.founder.state,
                world.workers.len(),
                world.colony.food,
                world.colony.deliveries,
                world.stats.cells_dug
            );
        }
    }

    let snapshot = world.snapshot();
    println!(
        "Done: {:?} founder, {} workers ({} peak), {} brood pending, {} deliveries",
        snapshot.founder.state,
        snapshot.workers.len(),
        snapshot.stats.peak_population,
        snapshot.brood.len(),
        snapshot.colony.deliveries
    );

    if let Some(path) = args.export {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(()) => println!("Snapshot written to {}", path),
                Err(err) => eprintln!("Failed to write {}: {}", path, err),
            },
            Err(err) => eprintln!("Failed to serialize snapshot: {}", err),
        }
    }
}
