use anyhow::{Context, Result};
use clap::Parser;
use sse_load_generator::client::make_client;
use sse_load_generator::config::LoadGeneratorInputs;
use sse_load_generator::counter::ConnectionCounter;
use sse_load_generator::operator::{self, OperatorLoop};
use sse_load_generator::runner::Fanout;
use sse_load_generator::worker::WorkerContext;
use sse_load_generator::{observability, shutdown, token};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let input = LoadGeneratorInputs::parse();
    observability::init_logging();
    input.validate()?;

    println!("Starting SSE Load Test");
    println!("Base URL: {}", input.base_url);

    let credential = token::issue_with_ttl(input.secret.as_bytes(), input.token_ttl())
        .context("failed to generate subscriber token")?;

    let cancel = CancellationToken::new();
    shutdown::spawn_signal_listener(cancel.clone())
        .context("failed to install signal handlers")?;

    let counter = Arc::new(ConnectionCounter::new());
    let fanout = Fanout::new(WorkerContext {
        client: make_client(input.http2),
        base_url: input.base_url.clone(),
        topic_prefix: input.topic_prefix.clone(),
        credential,
        counter: Arc::clone(&counter),
        policy: input.counter_policy(),
    });

    let mut prompt = OperatorLoop::new(fanout, counter, cancel, std::io::stdout());
    prompt
        .run(input.initial_connections, operator::spawn_stdin_reader())
        .await
        .context("operator prompt failed")?;
    Ok(())
}
