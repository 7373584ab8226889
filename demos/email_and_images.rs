//! Submits a mix of e-mail and image tasks to an unbuffered pool.
//!
//! Run with `RUST_LOG=debug cargo run --example email_and_images` to see
//! the workers pick up tasks.

use std::{thread, time::Duration};

use tracing::info;
use tracing_subscriber::EnvFilter;
use workerpool::{Task, WorkerPool};

struct EmailTask {
    address: String,
    header: String,
    body: String,
}

impl Task for EmailTask {
    fn execute(self: Box<Self>) {
        thread::sleep(Duration::from_millis(200));
        info!(
            address = %self.address,
            header = %self.header,
            body = %self.body,
            "email processed"
        );
    }
}

struct ImageTask {
    size: u32,
    name: String,
    format: String,
}

impl Task for ImageTask {
    fn execute(self: Box<Self>) {
        thread::sleep(Duration::from_millis(400));
        info!(
            name = %self.name,
            format = %self.format,
            size = self.size,
            "image processed"
        );
    }
}

fn email(n: usize) -> Box<dyn Task> {
    Box::new(EmailTask {
        address: format!("address_{n}@email.com"),
        header: format!("header {n}"),
        body: format!("body {n}"),
    })
}

fn image(n: usize, size: u32, format: &str) -> Box<dyn Task> {
    Box::new(ImageTask {
        size,
        name: format!("image_{n}"),
        format: format.to_owned(),
    })
}

fn main() -> Result<(), workerpool::PoolError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let tasks = vec![
        email(1),
        image(1, 50, "jpg"),
        email(2),
        image(2, 40, "png"),
        email(3),
        image(3, 20, "jpeg"),
        email(4),
    ];

    let pool = WorkerPool::unbuffered(9)?;
    for task in tasks {
        pool.submit_boxed(task)?;
    }
    pool.shutdown()
}
