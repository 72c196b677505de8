use anyhow::{Context, Result};
use crabline::app::handler::{handle_event, Transcript};
use crabline::app::state::ClientState;
use crabline::{config, logging, ChannelId, Event, IrcClient, ServerId};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::block_in_place;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = match &config_path {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    logging::init(&cfg.logging);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let client = IrcClient::new(&cfg, event_tx);
    let mut transcript = Transcript::new(cfg.ui.max_scrollback);

    let auto_connect: Vec<ServerId> = client.with_state(|s| {
        s.servers
            .iter()
            .filter(|srv| srv.auto_connect)
            .map(|srv| srv.id)
            .collect()
    });
    for id in auto_connect {
        if let Err(e) = block_in_place(|| client.connect(id)) {
            tracing::warn!("Auto-connect failed: {}", e);
        }
    }
    if client.active_server().is_none() {
        if let Some(&first) = client.server_ids().first() {
            client.set_active_server(first)?;
        }
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                match line.context("Failed to read from stdin")? {
                    Some(line) => handle_line(&client, &line),
                    None => break,
                }
            }
            Some(event) = event_rx.recv() => print_event(&client, &mut transcript, event),
        }
    }

    block_in_place(|| client.shutdown());
    while let Ok(event) = event_rx.try_recv() {
        print_event(&client, &mut transcript, event);
    }

    let updated = client.to_config(&cfg);
    match &config_path {
        Some(path) => config::save_config_to(path, &updated)?,
        None => config::save_config(&updated)?,
    }
    Ok(())
}

/// `/server N`, `/connect` and `/window N` are handled here; everything else
/// goes to the active server's input path.
fn handle_line(client: &IrcClient, line: &str) {
    if let Some(arg) = line.strip_prefix("/server ") {
        match arg.trim().parse::<ServerId>() {
            Ok(id) => report(client.set_active_server(id)),
            Err(_) => eprintln!("usage: /server <id>"),
        }
        return;
    }

    let Some(id) = client.active_server() else {
        eprintln!("No server configured");
        return;
    };
    if line == "/connect" {
        report(block_in_place(|| client.connect(id)));
    } else if let Some(arg) = line.strip_prefix("/window ") {
        match arg.trim().parse::<usize>() {
            Ok(index) => report(client.switch_channel(id, index).map(|_| ())),
            Err(_) => eprintln!("usage: /window <index>"),
        }
    } else {
        report(block_in_place(|| client.submit_input(id, line)));
    }
}

fn report(result: crabline::error::Result<()>) {
    if let Err(e) = result {
        tracing::warn!("{}", e);
    }
}

fn print_event(client: &IrcClient, transcript: &mut Transcript, event: Event) {
    let label = client.with_state(|s| label_for(s, event.server_id, event.channel_id));
    let key = handle_event(transcript, event);
    if let Some(line) = transcript.buffer(key).and_then(|buf| buf.lines().last()) {
        println!("[{}] {}", label, line);
    }
    transcript.mark_read(key);
}

fn label_for(state: &ClientState, server_id: ServerId, channel_id: Option<ChannelId>) -> String {
    let Some(server) = state.get_server(server_id) else {
        return format!("server {}", server_id);
    };
    match channel_id.and_then(|id| server.channel_by_id(id)) {
        Some(channel) => format!("{} {}", server.name, channel.display_name()),
        None => server.name.clone(),
    }
}
