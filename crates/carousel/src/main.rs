use carousel::scheduler::run_until_idle;
use carousel::{
    Animated, Carousel, CarouselSettings, ImageEntry, ManualClock, Point, RemoteCommand,
    SOCKET_PATH, Size, TickSource, layout,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::time::Duration;

const SIMULATION_FRAMES: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "vitrinectl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Show the next image.
    Next,
    /// Show the previous image.
    Prev,
    /// Reset the zoom of the active image.
    Reset,
    /// Jump to the image at INDEX.
    Goto { index: usize },
    /// Print how each card is drawn for a strip centered on POSITION.
    Layout {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        position: f64,
    },
    /// Drag the active card headlessly, release, and report where it settles.
    Simulate {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        /// Horizontal drag distance in pixels (positive is rightwards)
        #[arg(short, long, allow_negative_numbers = true)]
        drag: f64,
        /// Duration of the drag in milliseconds
        #[arg(long, default_value_t = 200)]
        duration_ms: u64,
        /// How long the pointer rests before release
        #[arg(long, default_value_t = 0)]
        hold_ms: u64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Next => send_command(RemoteCommand::Next),
        Commands::Prev => send_command(RemoteCommand::Previous),
        Commands::Reset => send_command(RemoteCommand::ResetZoom),
        Commands::Goto { index } => send_command(RemoteCommand::Goto(index)),
        Commands::Layout { count, position } => {
            print_layout(count, position);
            Ok(())
        }
        Commands::Simulate {
            count,
            drag,
            duration_ms,
            hold_ms,
        } => simulate(count, drag, duration_ms, hold_ms),
    }
}

fn print_layout(count: usize, position: f64) {
    println!(
        "{:>5} {:>8} {:>10} {:>6} {:>6} {:>6} {:>7} {:>4}",
        "card", "tier", "x", "scale", "blur", "bright", "opacity", "z"
    );
    for (i, v) in layout::layout(count, position).iter().enumerate() {
        println!(
            "{:>5} {:>8} {:>10.1} {:>6.3} {:>6.2} {:>6.3} {:>7.3} {:>4}",
            i, v.tier, v.translate_x, v.scale, v.blur, v.brightness, v.opacity, v.z_index
        );
    }
}

fn simulate(count: usize, drag: f64, duration_ms: u64, hold_ms: u64) -> anyhow::Result<()> {
    let entries: Vec<_> = (0..count)
        .map(|i| ImageEntry::new(format!("card-{i}"), ""))
        .collect();
    let mut carousel = Carousel::new(&entries, CarouselSettings::default())?;
    carousel.set_viewport(Size::new(1600.0, 900.0));

    let mut clock = ManualClock::new();
    let start = carousel.viewport().center();
    carousel.pointer_down(start, clock.now());

    let steps = (duration_ms as f64 / 16.667).ceil().max(1.0) as usize;
    for step in 1..=steps {
        let x = start.x + drag * step as f64 / steps as f64;
        carousel.pointer_move(Point::new(x, start.y), clock.frame());
    }
    clock.advance(Duration::from_millis(hold_ms));
    carousel.pointer_up(Point::new(start.x + drag, start.y), clock.now());
    println!(
        "released at velocity {:.2} px/frame ({})",
        carousel.velocity(),
        carousel.state()
    );

    let frames = run_until_idle(&mut carousel, &mut clock, SIMULATION_FRAMES);
    if carousel.is_animating() {
        anyhow::bail!("carousel still moving after {} frames", frames);
    }
    println!(
        "settled on card {} of {} after {} frames",
        carousel.current_index(),
        count,
        frames
    );
    Ok(())
}

fn send_command(command: RemoteCommand) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to vitrine at {}: {}. Is vitrine running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", command)?;
    Ok(())
}
