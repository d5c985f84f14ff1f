use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate, NaiveDateTime};

use auth_cell::AuthService;
use clinic_cell::{ClinicListing, ClinicQuery, ClinicService};
use queue_cell::{
    queue_position, ArrivalService, BookTokenRequest, Coordinates, CreateTokenRequest, LiveQueueEntry,
    PollSnapshot, QueuePoller, Token, TokenAction, TokenStatus, TokenService,
};
use schedule_cell::{compute_confirmation_window, ConfirmationWindow, DoctorSchedule, ScheduleService};
use shared_api_client::ClinicApiError;
use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, RegisterRequest, Session};

use crate::Commands;

fn explain(err: ClinicApiError) -> anyhow::Error {
    match err {
        ClinicApiError::Auth(_) => anyhow!("Your session has expired. Run 'clinicq login' again."),
        other => anyhow!(other.user_message()),
    }
}

fn require(session: &Option<Session>) -> anyhow::Result<&Session> {
    session
        .as_ref()
        .context("Not logged in. Run 'clinicq login' first.")
}

pub async fn run(command: Commands, config: &AppConfig, session: &mut Option<Session>) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let today = now.date();

    match command {
        Commands::Login { username, password, staff } => {
            let request = LoginRequest { username, password, staff };
            let new_session = AuthService::new(config).login(&request).await.map_err(explain)?;
            if let Some(user) = &new_session.user {
                println!("Logged in as {} ({})", user.display_name(), user.role);
            }
            *session = Some(new_session);
        }
        Commands::Register { username, password, confirm_password, name, age, phone } => {
            let request = RegisterRequest {
                username,
                password_confirmation: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                name,
                age,
                phone_number: phone,
            };
            let new_session = AuthService::new(config).register(&request).await.map_err(explain)?;
            if let Some(user) = &new_session.user {
                println!("Registered and logged in as {}", user.display_name());
            }
            *session = Some(new_session);
        }
        Commands::Logout => {
            *session = None;
            println!("Logged out.");
        }
        Commands::Whoami => {
            let refreshed = AuthService::new(config)
                .refresh(require(session)?)
                .await
                .map_err(explain)?;
            if let Some(user) = &refreshed.user {
                println!("{} ({}), role {}", user.display_name(), user.username, user.role);
                if let Some(clinic) = &user.clinic {
                    println!("Clinic: {}", clinic.name);
                }
            }
            *session = Some(refreshed);
        }
        Commands::Clinics { city, specialization } => {
            let query = ClinicQuery { city, specialization };
            let clinics = ClinicService::new(config).list_clinics(&query).await.map_err(explain)?;
            if clinics.is_empty() {
                println!("No clinics found.");
            }
            for clinic in &clinics {
                print_clinic(clinic);
            }
        }
        Commands::Doctors => {
            let doctors = ClinicService::new(config)
                .list_doctors(require(session)?)
                .await
                .map_err(explain)?;
            for doctor in &doctors {
                let specialization = doctor.specialization.as_deref().unwrap_or("-");
                println!("{:>6}  {:<25} {}", doctor.id, doctor.name, specialization);
            }
        }
        Commands::Slots { doctor_id, date, watch: true } => {
            watch_slots(config, session.clone(), doctor_id, date.unwrap_or(today)).await;
        }
        Commands::Slots { doctor_id, date, watch: false } => {
            let date = date.unwrap_or(today);
            let slots = ScheduleService::new(config)
                .available_slots(session.as_ref(), doctor_id, date, now)
                .await
                .map_err(explain)?;
            print_slots(&slots, date);
        }
        Commands::Preview { start, end, duration, max_slots, booked, date } => {
            let mut schedule = DoctorSchedule::new(0, &start, &end, duration);
            if let Some(max) = max_slots {
                schedule = schedule.with_max_slots(max);
            }
            let booked: Vec<String> = booked
                .as_deref()
                .map(|list| list.split(',').map(|t| t.trim().to_string()).collect())
                .unwrap_or_default();
            let date = date.unwrap_or(today);
            let slots = ScheduleService::preview_slots(&schedule, &booked, date, now).map_err(explain)?;
            print_slots(&slots, date);
        }
        Commands::Window { time: Some(time), date, watch: true } => {
            watch_appointment_window(&time, date.unwrap_or(today), config.window_refresh_interval()).await?;
        }
        Commands::Window { time: None, watch: true, .. } => {
            watch_token_window(config, require(session)?).await;
        }
        Commands::Window { time, date, watch: false } => {
            let window = match time {
                Some(time) => compute_confirmation_window(&time, date.unwrap_or(today), now)
                    .with_context(|| format!("Invalid appointment time: {}", time))?,
                None => {
                    let token = TokenService::new(config)
                        .my_token(require(session)?)
                        .await
                        .map_err(explain)?
                        .context("You have no active token.")?;
                    token
                        .confirmation_window(now)
                        .context("Walk-in tokens have no confirmation window.")?
                }
            };
            println!("{}", window_line(&window));
        }
        Commands::ConfirmArrival { lat, lon } => {
            let session = require(session)?;
            let token = TokenService::new(config).my_token(session).await.map_err(explain)?;
            let outcome = ArrivalService::new(config)
                .confirm_arrival(session, token.as_ref(), Coordinates { latitude: lat, longitude: lon }, now)
                .await
                .map_err(explain)?;
            println!("{}", outcome.message);
            if let Some(distance) = outcome.distance_km {
                println!("Distance to clinic: {:.2} km", distance);
            }
            print_token(&outcome.token);
        }
        Commands::Book { doctor_id, date, time } => {
            let request = BookTokenRequest { doctor_id, date, time };
            let token = TokenService::new(config)
                .book(require(session)?, &request, now)
                .await
                .map_err(explain)?;
            println!("Booked.");
            print_token(&token);
        }
        Commands::Cancel => {
            let message = TokenService::new(config)
                .cancel_mine(require(session)?)
                .await
                .map_err(explain)?;
            println!("{}", message);
        }
        Commands::WalkIn { name, age, phone, doctor, time } => {
            let request = CreateTokenRequest {
                patient_name: name,
                patient_age: age,
                phone_number: phone,
                assigned_doctor: doctor,
                appointment_time: time,
            };
            let token = TokenService::new(config)
                .create_token(require(session)?, &request)
                .await
                .map_err(explain)?;
            print_token(&token);
        }
        Commands::Tokens { date } => {
            let tokens = TokenService::new(config)
                .list_tokens(require(session)?, date)
                .await
                .map_err(explain)?;
            if tokens.is_empty() {
                println!("No tokens found.");
            }
            for token in &tokens {
                print_token(token);
            }
        }
        Commands::Status { token_id, action, current } => {
            let action: TokenAction = action.parse().map_err(|e: String| anyhow!(e))?;
            let current = current
                .map(|s| s.parse::<TokenStatus>())
                .transpose()
                .map_err(|e| anyhow!(e))?;
            let token = TokenService::new(config)
                .update_status(require(session)?, token_id, action, current)
                .await
                .map_err(explain)?;
            print_token(&token);
        }
        Commands::WatchQueue { doctor_id, date, token, interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.queue_poll_interval());
            watch_queue(config, doctor_id, date.unwrap_or(today), token, interval).await;
        }
    }

    Ok(())
}

/// Hands every completed poll to `show` until Ctrl-C, then stops the poller.
async fn follow<T>(poller: QueuePoller<T>, mut show: impl FnMut(&PollSnapshot<T>))
where
    T: Clone + Send + Sync + 'static,
{
    let mut updates = poller.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                show(&snapshot);
            }
        }
    }

    poller.stop().await;
}

async fn watch_queue(config: &AppConfig, doctor_id: i64, date: NaiveDate, highlight: Option<i64>, interval: Duration) {
    let tokens = Arc::new(TokenService::new(config));
    let poller = QueuePoller::spawn(format!("queue-{}-{}", doctor_id, date), interval, move || {
        let tokens = tokens.clone();
        async move { tokens.live_queue(doctor_id, date).await }
    });

    println!("Watching doctor {} on {} every {}s. Ctrl-C to stop.", doctor_id, date, interval.as_secs());

    follow(poller, |snapshot| print_queue(snapshot, highlight)).await;
}

/// Reprints a doctor's free slots whenever they change.
async fn watch_slots(config: &AppConfig, session: Option<Session>, doctor_id: i64, date: NaiveDate) {
    let interval = config.slot_poll_interval();
    let schedules = Arc::new(ScheduleService::new(config));
    let poller = QueuePoller::spawn(format!("slots-{}-{}", doctor_id, date), interval, move || {
        let schedules = schedules.clone();
        let session = session.clone();
        async move {
            schedules
                .available_slots(session.as_ref(), doctor_id, date, Local::now().naive_local())
                .await
        }
    });

    println!("Watching slots of doctor {} on {} every {}s. Ctrl-C to stop.", doctor_id, date, interval.as_secs());

    let mut last: Option<Vec<String>> = None;
    follow(poller, |snapshot| {
        if let Some(error) = &snapshot.last_error {
            eprintln!("Update failed: {}", error);
        }
        if let Some(slots) = &snapshot.value {
            if last.as_ref() != Some(slots) {
                print_slots(slots, date);
                last = Some(slots.clone());
            }
        }
    })
    .await;
}

/// Recomputes the window of a fixed appointment on every refresh tick.
async fn watch_appointment_window(time: &str, date: NaiveDate, refresh: Duration) -> anyhow::Result<()> {
    if compute_confirmation_window(time, date, Local::now().naive_local()).is_none() {
        return Err(anyhow!("Invalid appointment time: {}", time));
    }

    let mut ticker = tokio::time::interval(refresh);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }
        if let Some(window) = compute_confirmation_window(time, date, Local::now().naive_local()) {
            print_if_changed(&mut last, window_line(&window));
        }
    }

    Ok(())
}

/// Follows the caller's own token. The token is re-read every token poll
/// interval and the window recomputed every refresh tick in between, so a
/// window opens on screen even when the token itself does not change.
async fn watch_token_window(config: &AppConfig, session: &Session) {
    let tokens = Arc::new(TokenService::new(config));
    let session = session.clone();
    let poller = QueuePoller::spawn("my-token", config.token_poll_interval(), move || {
        let tokens = tokens.clone();
        let session = session.clone();
        async move { tokens.my_token(&session).await }
    });

    println!("Watching your token. Ctrl-C to stop.");

    let mut updates = poller.subscribe();
    let mut ticker = tokio::time::interval(config.window_refresh_interval());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let error = updates.borrow_and_update().last_error.clone();
                if let Some(error) = error {
                    eprintln!("Update failed: {}", error);
                }
            }
            _ = ticker.tick() => {}
        }

        if let Some(token) = poller.latest().value {
            print_if_changed(&mut last, token_window_line(token.as_ref(), Local::now().naive_local()));
        }
    }

    poller.stop().await;
}

fn print_if_changed(last: &mut Option<String>, line: String) {
    if last.as_deref() != Some(line.as_str()) {
        println!("{}", line);
        *last = Some(line);
    }
}

fn print_slots(slots: &[String], date: NaiveDate) {
    if slots.is_empty() {
        println!("No available slots on {}.", date);
    } else {
        println!("{} slots on {}: {}", slots.len(), date, slots.join(", "));
    }
}

fn window_line(window: &ConfirmationWindow) -> String {
    window.message().unwrap_or_else(|| {
        format!("Confirmation window is open until {}.", window.end.format("%-I:%M %p"))
    })
}

fn token_window_line(token: Option<&Token>, now: NaiveDateTime) -> String {
    match token {
        None => "You have no active token.".to_string(),
        Some(token) => match token.confirmation_window(now) {
            Some(window) => format!("{}: {}", token.label(), window_line(&window)),
            None => format!("{} is a walk-in token with no confirmation window.", token.label()),
        },
    }
}

fn print_clinic(clinic: &ClinicListing) {
    let city = clinic.city.as_deref().unwrap_or("-");
    println!("{} ({}), {}", clinic.name, clinic.id, city);
    if let Some(wait) = clinic.average_wait_time {
        println!("  Average wait: {:.0} min", wait);
    }
    for doctor in &clinic.doctors {
        let specialization = doctor.specialization.as_deref().unwrap_or("-");
        println!("  {:>6}  {:<25} {}", doctor.id, doctor.name, specialization);
    }
}

fn print_token(token: &Token) {
    let time = token.appointment_time.as_deref().unwrap_or("walk-in");
    let patient = token.patient.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
    println!("{:>8}  {:<15} {:<10} {}", token.label(), token.status, time, patient);
}

fn print_queue(snapshot: &PollSnapshot<Vec<LiveQueueEntry>>, highlight: Option<i64>) {
    if let Some(error) = &snapshot.last_error {
        eprintln!("Update failed: {}", error);
    }
    let Some(entries) = &snapshot.value else {
        return;
    };

    println!("--- {} in queue ---", entries.len());
    for entry in entries {
        let marker = if Some(entry.id) == highlight { "*" } else { " " };
        let label = entry.token_number.clone().unwrap_or_else(|| format!("#{}", entry.id));
        let time = entry.appointment_time.as_deref().unwrap_or("walk-in");
        println!("{} {:>8}  {:<15} {}", marker, label, entry.status, time);
    }
    if let Some(id) = highlight {
        match queue_position(entries, id) {
            Some(0) => println!("You are next."),
            Some(ahead) => println!("{} ahead of you.", ahead),
            None => println!("Token {} is not in the queue.", id),
        }
    }
}
