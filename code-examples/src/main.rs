use async_std::task::block_on;

use crate::asynchronous::{
    example_check_health, example_fallback_chain, example_limited_recovery, example_retry,
    example_timeout,
};

mod asynchronous;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    block_on(async {
        println!("Running retry with backoff example:");
        example_retry().await;

        println!("\nRunning timeout example:");
        example_timeout().await;

        println!("\nRunning fallback chain example:");
        example_fallback_chain().await;

        println!("\nRunning limited recovery example:");
        example_limited_recovery().await;

        println!("\nRunning health check example:");
        example_check_health().await;
    });
}
