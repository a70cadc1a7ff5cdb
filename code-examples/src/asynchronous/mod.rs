use std::time::Duration;

use async_std::future::pending;
use async_std::task::{sleep, spawn};
use futures::FutureExt;
use futures::future::join_all;
use rand::{Rng, rng};

use recovery_rs::asynchronous::{
    FallbackOption, Recovery, fallback, partial_results, retry, with_timeout,
};
use recovery_rs::config::RetryConfig;
use recovery_rs::limiter::ConcurrencyLimiter;

// Simulates a quote endpoint that answers 503 about half of the time
async fn fetch_price(symbol: &str) -> Result<f64, String> {
    sleep(Duration::from_millis(20)).await;
    if rng().random_range(0..2) == 0 {
        return Err(format!("503 Service Unavailable ({symbol})"));
    }
    Ok(rng().random_range(100.0..200.0))
}

// Example 1: Retry a flaky call with jittered exponential backoff
pub async fn example_retry() {
    let config = RetryConfig::new(3, Duration::from_millis(100), Duration::from_secs(1))
        .with_retry_condition(|e: &String| e.starts_with("503"));

    match retry(|| fetch_price("AAPL"), &config, "fetchPrice").await {
        Ok(price) => println!("AAPL: {price:.2}"),
        Err(e) => println!("Gave up: {e}"),
    }
}

// Example 2: Give up on a call that never answers
pub async fn example_timeout() {
    let result = with_timeout(
        pending::<Result<String, String>>(),
        Duration::from_millis(50),
        "slowCall",
    )
    .await;

    match result {
        Ok(body) => println!("Answered: {body}"),
        Err(e) if e.is_timeout() => println!("Timed out: {e}"),
        Err(e) => println!("Failed: {e}"),
    }
}

// Example 3: Try alternative sources in order
pub async fn example_fallback_chain() {
    let options: Vec<FallbackOption<'static, String, String>> = vec![
        Box::new(|| async { Err("Yahoo Finance: CORS proxy blocked".to_string()) }.boxed()),
        Box::new(|| {
            async {
                fetch_price("BTC-USD")
                    .await
                    .map(|price| format!("BTC-USD {price:.2} (live)"))
            }
            .boxed()
        }),
        Box::new(|| async { Ok("BTC-USD 64000.00 (cached)".to_string()) }.boxed()),
    ];

    match fallback(options, "cryptoQuote").await {
        Ok(quote) => println!("{quote}"),
        Err(e) => {
            println!("{e}");
            for cause in e.errors() {
                println!("  caused by: {cause}");
            }
        }
    }
}

// Example 4: Many recovery calls sharing a concurrency limit
pub async fn example_limited_recovery() {
    let recovery = Recovery::new().with_limiter(ConcurrencyLimiter::default());
    let config = RetryConfig::new(1, Duration::from_millis(50), Duration::from_millis(200));

    let symbols = ["AAPL", "MSFT", "NVDA", "TSLA", "AMZN", "GOOG"];
    let tasks = symbols.map(|symbol| {
        let recovery = recovery.clone();
        let config = config.clone();
        spawn(async move {
            let report = recovery
                .recover_or_else(
                    || fetch_price(symbol),
                    &config,
                    symbol,
                    || async { Err("no cached quote".to_string()) },
                )
                .await;
            println!(
                "{symbol}: success={} attempts={} fallback_used={}",
                report.is_success(),
                report.attempts,
                report.fallback_used
            );
            report.outcome.ok()
        })
    });

    let prices = partial_results(join_all(tasks).await, 3);
    println!("Usable prices: {}/{}", prices.len(), symbols.len());
}

// Example 5: Probe a dependency with a bounded wait
pub async fn example_check_health() {
    let recovery = Recovery::new().with_health_check_timeout(Duration::from_millis(100));

    let healthy = recovery
        .check_health("wikipedia", || async {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, String>(true)
        })
        .await;
    println!("wikipedia healthy: {healthy}");

    let healthy = recovery
        .check_health("hackernews", || async {
            sleep(Duration::from_millis(500)).await;
            Ok::<_, String>(true)
        })
        .await;
    println!("hackernews healthy: {healthy}");
}
