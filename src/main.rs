use std::env;
use std::process;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use reservation_form::cli::{parse_command, Command, CommandError, HELP};
use reservation_form::services::time_slots::format_slot;
use reservation_form::{
    AvailabilityClient, Field, FormConfig, FormController, SessionContext, Step, SubmitOutcome,
    WebhookClient,
};

fn print_step(controller: &FormController) {
    let step = controller.step();
    if let Some(label) = step.progress_label() {
        println!("== {} ==", label);
    }

    match step {
        Step::MenuSelection => {
            println!("来院区分: first (初診) / revisit (再診)");
            let menus = controller.available_menus();
            if menus.is_empty() {
                println!("(choose a visit type to see the menus)");
            }
            for menu in menus {
                println!(
                    "  {:<14} {} ({}分)",
                    menu.id, menu.name, menu.duration_min
                );
            }
        }
        Step::DateTime => {
            for card in controller.selectable_dates() {
                println!(
                    "  {} {}（{}）",
                    card.date,
                    card.relative_label.unwrap_or(""),
                    card.weekday_label
                );
            }
            let slots: Vec<String> = controller
                .slot_availability()
                .into_iter()
                .map(|(slot, free)| {
                    if free {
                        format_slot(slot)
                    } else {
                        format!("({})", format_slot(slot))
                    }
                })
                .collect();
            println!("  times: {}", slots.join(" "));
            if controller.availability_pending() {
                println!("  (checking availability...)");
            }
        }
        Step::CustomerInfo => {
            let draft = controller.draft();
            println!("  name: {}", draft.customer_name);
            println!("  phone: {}", draft.phone);
            if let Some((current, max)) = controller.char_count(Field::SymptomNote) {
                println!("  symptom: {} [{}/{}]", draft.symptom_note, current, max);
            }
            if let Some((current, max)) = controller.char_count(Field::Memo) {
                println!("  memo: {} [{}/{}]", draft.memo, current, max);
            }
        }
        Step::Confirm => match controller.confirmation() {
            Some(confirmation) => println!("{}", confirmation),
            None => println!("(nothing to confirm)"),
        },
        Step::Completed => {
            println!("ご予約を受け付けました");
            if let Some(summary) = controller.completion_summary() {
                println!("{}", summary);
            }
        }
        Step::Failed => println!("送信に失敗しました。'retry' で再送信できます"),
    }

    for (field, message) in controller.errors().errors() {
        println!("  ! {}: {}", field, message);
    }
}

fn report_outcome(controller: &FormController, outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Completed | SubmitOutcome::Failed | SubmitOutcome::Invalid => {
            print_step(controller)
        }
        SubmitOutcome::AlreadyInFlight => println!("送信中です"),
        SubmitOutcome::NotReady(step) => println!("cannot submit from {:?}", step),
    }
}

async fn run(controller: &mut FormController) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_step(controller);

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        controller.poll_availability();

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let selection = match command {
            Command::Visit(visit_type) => controller.select_visit_type(visit_type),
            Command::Menu(id) => controller.select_menu(&id),
            Command::Date(date) => controller.select_date(date),
            Command::Time(time) => controller.select_time(time),
            Command::Name(value) => controller.set_customer_name(value),
            Command::Phone(value) => controller.set_phone(value),
            Command::Symptom(value) => controller.set_symptom_note(value),
            Command::Memo(value) => controller.set_memo(value),
            Command::Check(field) => {
                match controller.check_field(field) {
                    Some(message) => println!("  ! {}: {}", field, message),
                    None => println!("  {} ok", field),
                }
                Ok(())
            }
            Command::Next => {
                let _ = controller.advance();
                print_step(controller);
                Ok(())
            }
            Command::Back => {
                controller.retreat();
                print_step(controller);
                Ok(())
            }
            Command::Edit => {
                controller.edit();
                print_step(controller);
                Ok(())
            }
            Command::Submit => {
                let outcome = controller.submit().await;
                report_outcome(controller, outcome);
                Ok(())
            }
            Command::Retry => {
                let outcome = controller.retry().await;
                report_outcome(controller, outcome);
                Ok(())
            }
            Command::Show => {
                print_step(controller);
                Ok(())
            }
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Quit => break,
        };

        if let Err(e) = selection {
            println!("{}", e);
        }

        if controller.step() == Step::Completed {
            break;
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match FormConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid form configuration: {}", e);
            process::exit(1);
        }
    };

    // Host-supplied identity; absent outside the messaging app
    let session = SessionContext::from_host(
        env::var("LIFF_USER_ID").ok(),
        env::var("LIFF_LAUNCH_URL").ok().as_deref(),
        config.default_source,
    );

    let webhook = match WebhookClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build webhook client: {}", e);
            process::exit(1);
        }
    };
    info!("Reservations will be sent to {}", webhook.webhook_url());

    let availability = if config.availability_enabled() {
        match AvailabilityClient::new(config.availability_api_url.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Availability lookup disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    println!("{}", config.header_title);

    let mut controller = FormController::new(Arc::new(config), session, Arc::new(webhook));
    if let Some(client) = availability {
        controller = controller.with_availability(Arc::new(client));
    }

    run(&mut controller).await;
    info!("Reservation form closed in step {:?}", controller.step());
}
