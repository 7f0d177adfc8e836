use anyhow::Context;
use chat_surface::{ChatSurface, HttpChatBackend, Message, SubmitOutcome};
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::EnvFilter;

const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Closed,
    Interrupted,
}

/// Next line of input, or `Interrupted` if `interrupt` fires first.
async fn next_input<R, I>(lines: &mut Lines<R>, interrupt: I) -> std::io::Result<Input>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?.map_or(Input::Closed, Input::Line)),
        signal = interrupt => {
            signal?;
            Ok(Input::Interrupted)
        }
    }
}

fn render(message: &Message) {
    println!("\n{}", message.content);
    if !message.sources.is_empty() {
        println!("\nSources:");
        for source in &message.sources {
            println!("  - {}", source);
        }
    }
    println!();
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let base_url = std::env::var("CHAT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let backend = HttpChatBackend::new(&base_url).context("failed to create HTTP client")?;
    let surface = ChatSurface::new(backend);

    if let Some(greeting) = surface.last_message() {
        render(&greeting);
    }
    println!("(Ctrl-C stops a pending answer, /quit exits)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = match next_input(&mut lines, tokio::signal::ctrl_c()).await? {
            Input::Line(line) => line,
            Input::Closed => break,
            Input::Interrupted => {
                println!();
                // The blocking stdin read cannot be cancelled, so runtime
                // shutdown would wait for another line.
                std::process::exit(0);
            }
        };
        if line.trim() == "/quit" {
            break;
        }

        surface.set_input(line);
        let submit = surface.submit();
        tokio::pin!(submit);

        let outcome = loop {
            tokio::select! {
                outcome = &mut submit => break outcome,
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for Ctrl-C")?;
                    surface.stop();
                }
            }
        };

        if outcome != SubmitOutcome::Ignored {
            if let Some(reply) = surface.last_message() {
                render(&reply);
            }
        }
    }

    Ok(())
}
