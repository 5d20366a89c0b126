//! Icecream shop example
//!
//! A vendor service with three workers serves orders produced by a second,
//! single-worker customer service. The main thread polls queue depth until the
//! customers are done, then closes both services.
//!
//! Run with: RUST_LOG=info cargo run --example basic_service

use rust_service_system::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const FLAVORS: [&str; 8] = [
    "Strawberry",
    "Vanilla",
    "Chocolate",
    "Banana",
    "Cherry",
    "Lemon",
    "Mango",
    "Pistachio",
];

struct IcecreamVendor {
    service: Service,
}

impl IcecreamVendor {
    fn new() -> Result<Self> {
        let config = ServiceConfig::new("Icecream Service")
            .with_queue_capacity(8)
            .with_job_timeout(Duration::from_millis(500))
            .with_thread_name_prefix("vendor");
        Ok(Self {
            service: Service::with_config(config)?,
        })
    }

    fn serve_icecream(&self, order: String) -> Result<JobFuture<String>> {
        let name = self.service.name().to_string();
        self.service.submit_with(order, move |order| {
            println!("{}: working on order ({})", name, order);
            let minutes = 3 + order.len() % 4;
            thread::sleep(Duration::from_millis(minutes as u64 * 20));
            println!("{}: finished order ({}), took {} minutes", name, order, minutes);
            format!("Cone with: {}", order)
        })
    }
}

struct Customers {
    service: Service,
    vendor: Arc<IcecreamVendor>,
}

impl Customers {
    fn new(vendor: Arc<IcecreamVendor>) -> Result<Self> {
        Ok(Self {
            service: Service::new("Customers")?,
            vendor,
        })
    }

    /// Three groups arrive over the day; each customer orders one cone.
    fn simulate(&self) -> Result<JobFuture<usize>> {
        let vendor = Arc::clone(&self.vendor);
        self.service.submit_promise(move |promise: JobPromise<usize>| {
            let mut served = 0;
            let groups = [("morning", 140, 2), ("midday", 60, 4), ("evening", 200, 5)];
            for (label, pause_ms, group_size) in groups {
                thread::sleep(Duration::from_millis(pause_ms));
                println!("{} group arrives with {} customers", label, group_size);
                for customer in 0..group_size {
                    let order = format!(
                        "{} {}",
                        FLAVORS[(served + customer) % FLAVORS.len()],
                        FLAVORS[(served * 3 + customer) % FLAVORS.len()]
                    );
                    match vendor.serve_icecream(order) {
                        Err(e) if e.is_dropped_job() => {
                            log::warn!("customer left without a cone: {}", e)
                        }
                        Err(e) => log::error!("order failed: {}", e),
                        Ok(_) => {}
                    }
                }
                served += group_size;
            }
            promise.fulfill(served);
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Rust Service System - Icecream Shop Example ===\n");

    let vendor = Arc::new(IcecreamVendor::new()?);
    let customers = Customers::new(Arc::clone(&vendor))?;

    println!("The store is open.");
    vendor.service.detach(3)?;
    customers.service.detach(1)?;

    let day = customers.simulate()?;
    let arrived = loop {
        match day.wait_timeout(Duration::from_millis(100)) {
            Ok(arrived) => break arrived,
            Err(ServiceError::FutureTimeout { .. }) => println!(
                "Waiting customers: {}. Total served: {}",
                vendor.service.current_jobs(),
                vendor.service.total_jobs()
            ),
            Err(e) => return Err(e),
        }
    };

    println!("Store is closed, working on the final orders.");
    customers.service.join()?;
    vendor.service.join()?;

    let stats = vendor.service.stats();
    println!(
        "{} customers arrived, {} were served, {} left without a cone.",
        arrived, stats.completed, stats.rejected
    );
    println!(
        "Statistics: {}",
        serde_json::to_string(&stats).unwrap_or_default()
    );

    Ok(())
}
