//! ChannelWriter CLI Demo
//!
//! Every stdin line is written as one buffer; a consumer task prints the
//! buffers as they come off the queue.
//!
//! Usage: `writechan-demo [config.json]`

use std::io::{self, BufRead};

use writechan::{ChannelWriter, VecBuffer, WriterConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => WriterConfig::from_slice(&std::fs::read(path)?)?,
        None => WriterConfig::default(),
    };
    log::info!("Starting with {config:?}");

    let (writer, mut rx) = ChannelWriter::channel(&config)?;

    let consumer_task = tokio::spawn(async move {
        let mut count = 0usize;
        while let Some(buffer) = rx.recv().await {
            count += 1;
            print_buffer(count, &buffer);
        }
        println!("Queue closed after {count} buffers");
    });

    // stdin is read on a blocking thread, where `write_sync` is allowed
    let writer_task = tokio::task::spawn_blocking(move || {
        println!("Enter text (empty line to quit):");
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Err(e) = writer.write_sync(trimmed.as_bytes()) {
                eprintln!("Write error: {e}");
            }
        }
        // dropping the writer closes the queue
    });

    let (writer_result, consumer_result) = tokio::join!(writer_task, consumer_task);
    writer_result?;
    consumer_result?;
    Ok(())
}

fn print_buffer(index: usize, buffer: &VecBuffer) {
    let text = String::from_utf8_lossy(buffer);
    println!("[{index}] {} bytes: {text}", buffer.len());
}
