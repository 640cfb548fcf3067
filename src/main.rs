use std::env;
use std::io;
use std::process::ExitCode;

use tokio_stream::wrappers::ReceiverStream;
use tracing::level_filters::LevelFilter;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use trip_ledger::csv::{read_events, read_trip, write_report};
use trip_ledger::{Amount, MemoryStore, Trip, TripSession, validate};

const USAGE: &str = "usage: trip-ledger <participants.csv> <events.csv> [total_pooled]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (participants_path, events_path) = match (args.first(), args.get(1)) {
        (Some(participants), Some(events)) => (participants.clone(), events.clone()),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let listed = match read_trip(&participants_path) {
        Ok(trip) => trip,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // blank rows are dropped, so rebuild the trip from the cleaned names
    let names = match validate::participants(&listed.participants) {
        Ok(names) => names,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut trip = Trip::pooled(names.into_iter().map(|name| {
        let contribution = listed.contribution(&name);
        (name, contribution)
    }));

    if let Some(pooled) = args.get(2) {
        match pooled.parse::<f64>().ok().and_then(Amount::try_from_float) {
            Some(total) => {
                trip.total_pooled = total;
                // no contributions listed: equal-division mode
                if trip.contributions.values().all(|c| *c == Amount::ZERO) {
                    trip.contributions =
                        validate::equal_contributions(&trip.participants, trip.total_pooled);
                }
            }
            None => {
                error!(total_pooled = %pooled, "total pooled is not a valid amount");
                return ExitCode::from(2);
            }
        }
    }

    if let Err(e) = validate::fund_setup(&trip) {
        warn!(reason = %e, "every fund expense will need a designated payer");
    }

    let events = match read_events(events_path) {
        Ok(events) => events,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = TripSession::new(MemoryStore::new(trip));
    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in events {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    session.run(ReceiverStream::new(command_receiver)).await;

    let report = match session.report() {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_report(&report, io::stdout().lock()) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
