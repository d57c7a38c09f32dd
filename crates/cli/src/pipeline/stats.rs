//! Run statistics printed after shutdown.

use std::time::Duration;

use dispatcher::{DispatchExit, DispatchReport};
use ingestion::{ProducerExit, ProducerReport};
use lifecycle::ShutdownReason;

/// Statistics from one relay run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Total wall-clock duration of the run
    pub duration: Duration,

    /// Queue capacity used for the run
    pub capacity: usize,

    /// What triggered shutdown
    pub shutdown_reason: Option<ShutdownReason>,

    /// Producer report, `None` if the task panicked
    pub producer: Option<ProducerReport>,

    /// Dispatcher report, `None` if the task panicked
    pub dispatch: Option<DispatchReport>,
}

impl RunStats {
    /// Facts accepted by the queue
    pub fn accepted(&self) -> u64 {
        self.producer.map(|p| p.accepted).unwrap_or(0)
    }

    /// Facts delivered successfully
    pub fn delivered(&self) -> u64 {
        self.dispatch.as_ref().map(|d| d.delivered).unwrap_or(0)
    }

    /// Delivered facts per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.delivered() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Queue capacity: {}", self.capacity);
        println!("   ├─ Throughput: {:.2} facts/s", self.throughput());
        match self.shutdown_reason {
            Some(reason) => println!("   └─ Shutdown reason: {}", reason),
            None => println!("   └─ Shutdown reason: (none)"),
        }

        println!("\n📥 Producer");
        match &self.producer {
            Some(p) => {
                println!("   ├─ Produced: {}", p.produced);
                println!("   ├─ Accepted: {}", p.accepted);
                println!("   ├─ Dropped: {} (faults: {})", p.dropped, p.faults);
                println!("   └─ Exit: {}", producer_exit(p.exit));
            }
            None => println!("   └─ (task failed)"),
        }

        println!("\n📤 Dispatcher");
        match &self.dispatch {
            Some(d) => {
                println!("   ├─ Delivered: {}", d.delivered);
                println!("   ├─ Failed: {} (timed out: {})", d.failed, d.timed_out);
                println!("   ├─ Abandoned: {}", d.abandoned);
                println!("   └─ Exit: {}", dispatch_exit(d.exit));
                println!();
                print!("{}", d.summary);
            }
            None => println!("   └─ (task failed)"),
        }

        println!();
    }
}

fn producer_exit(exit: ProducerExit) -> &'static str {
    match exit {
        ProducerExit::Exhausted => "source exhausted",
        ProducerExit::Cancelled => "cancelled",
    }
}

fn dispatch_exit(exit: DispatchExit) -> &'static str {
    match exit {
        DispatchExit::Drained => "queue drained",
        DispatchExit::Cancelled => "cancelled",
    }
}
