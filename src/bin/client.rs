//! Plain command-line client for the PARLOR chat server.
//!
//! A thin I/O wrapper over the wire protocol: the first line typed is the
//! display name, every following line is sent as chat, and `/exit` leaves.
//! Received lines are printed as-is.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use parlor::EXIT_COMMAND;

#[tokio::main]
async fn main() {
    let host = std::env::var("PARLOR_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("PARLOR_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(12345);

    let stream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Could not connect to {host}:{port}: {e}");
            std::process::exit(1);
        }
    };
    println!("Connected to server {host}:{port}");

    let (read_half, mut write_half) = stream.into_split();
    let mut server_lines = BufReader::new(read_half).lines();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                match line {
                    Ok(Some(line)) => println!("{line}"),
                    _ => {
                        println!("Disconnected from server.");
                        break;
                    }
                }
            }
            line = stdin_lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if write_half
                    .write_all(format!("{line}\n").as_bytes())
                    .await
                    .is_err()
                {
                    println!("Disconnected from server.");
                    break;
                }
                if line.trim().eq_ignore_ascii_case(EXIT_COMMAND) {
                    break;
                }
            }
        }
    }
}
