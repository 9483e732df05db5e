//! Main application logic and persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Legend, Plot};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use log::info;

mod aggregate;
mod api;
mod capture;
mod chart;
mod export;
mod forms;
mod report;
mod workout;

use aggregate::{ALL_PERIODS, Period};
use api::{ApiError, Session, StorageClient, resolve_access_token, resolve_api_key};
use capture::save_chart_region;
use forms::{DialogPhase, FormTab, WorkoutDialog};
use workout::{
    ALL_MUSCLE_GROUPS, ExerciseType, MuscleGroup, Workout, WorkoutDetails, default_group_for,
    group_label,
};

fn default_recent_limit() -> usize {
    3
}

/// Persistent configuration: backend credentials and dashboard preferences.
///
/// Serialized as JSON under the user config directory. `#[serde(default)]`
/// keeps older files loadable when fields are added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
struct Settings {
    base_url: String,
    api_key: String,
    access_token: String,
    chart_period: Period,
    recent_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            access_token: String::new(),
            chart_period: Period::default(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Settings {
    const FILE: &'static str = "fitness_tracker_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(cfg) = serde_json::from_str(&data) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, data);
            }
        }
    }
}

fn build_client(settings: &Settings) -> Option<StorageClient> {
    if settings.base_url.trim().is_empty() {
        return None;
    }
    let api_key =
        resolve_api_key((!settings.api_key.is_empty()).then_some(settings.api_key.as_str()))?;
    let token = resolve_access_token(
        (!settings.access_token.is_empty()).then_some(settings.access_token.as_str()),
    )?;
    Some(StorageClient::new(settings.base_url.trim(), api_key, token))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Home,
    Workouts,
    Data,
}

/// Results delivered from worker threads back to the frame loop.
enum AppEvent {
    SessionLoaded(Result<Option<Session>, ApiError>),
    WorkoutsLoaded(Result<Vec<Workout>, ApiError>),
    TypesLoaded(Result<Vec<ExerciseType>, ApiError>),
    Submitted(Result<Workout, ApiError>),
    Updated(Result<(), ApiError>),
    Deleted(String, Result<(), ApiError>),
    Imported(Result<usize, ApiError>),
    SignedOut(Result<(), ApiError>),
}

struct DashboardApp {
    settings: Settings,
    settings_dirty: bool,
    show_settings: bool,
    client: Option<StorageClient>,
    session: Option<Session>,
    page: Page,
    workouts: Vec<Workout>,
    exercise_types: Vec<ExerciseType>,
    fetching: bool,
    dialog: Option<WorkoutDialog>,
    pending_delete: Option<String>,
    deleting: bool,
    importing: bool,
    toast: Option<(String, Instant)>,
    error_toast: Option<(String, Instant)>,
    capture_rect: Option<egui::Rect>,
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,
}

impl Default for DashboardApp {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        let settings = Settings::load();
        let mut app = Self {
            settings,
            settings_dirty: false,
            show_settings: false,
            client: None,
            session: None,
            page: Page::Home,
            workouts: Vec::new(),
            exercise_types: Vec::new(),
            fetching: false,
            dialog: None,
            pending_delete: None,
            deleting: false,
            importing: false,
            toast: None,
            error_toast: None,
            capture_rect: None,
            tx,
            rx,
        };
        app.connect();
        app
    }
}

impl DashboardApp {
    /// Rebuild the storage client from the current settings and look up the
    /// session. Missing credentials leave the app disconnected; the settings
    /// window explains what to fill in.
    fn connect(&mut self) {
        self.session = None;
        self.workouts.clear();
        self.exercise_types.clear();
        self.client = build_client(&self.settings);
        match self.client {
            Some(_) => {
                self.spawn_request(|client| AppEvent::SessionLoaded(client.current_session()));
            }
            None => log::warn!("storage credentials are not configured"),
        }
    }

    fn spawn_request(&self, job: impl FnOnce(StorageClient) -> AppEvent + Send + 'static) {
        if let Some(client) = self.client.clone() {
            let tx = self.tx.clone();
            std::thread::spawn(move || {
                let _ = tx.send(job(client));
            });
        }
    }

    /// Re-fetch the workout list and exercise catalog. One fetch in flight at
    /// a time; the refresh control is disabled while this runs.
    fn refresh(&mut self) {
        if self.fetching {
            return;
        }
        let Some(owner) = self.session.as_ref().map(|s| s.user_id.clone()) else {
            return;
        };
        let Some(client) = self.client.clone() else {
            return;
        };
        self.fetching = true;
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(AppEvent::WorkoutsLoaded(client.list_workouts(&owner)));
            let _ = tx.send(AppEvent::TypesLoaded(client.list_exercise_types(&owner)));
        });
    }

    fn toast(&mut self, message: impl Into<String>) {
        self.toast = Some((message.into(), Instant::now()));
    }

    fn error(&mut self, message: impl Into<String>) {
        self.error_toast = Some((message.into(), Instant::now()));
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionLoaded(Ok(Some(session))) => {
                info!("signed in as {}", session.email);
                self.session = Some(session);
                self.refresh();
            }
            AppEvent::SessionLoaded(Ok(None)) => {
                self.error("Not signed in. Check the access token in Settings.");
            }
            AppEvent::SessionLoaded(Err(e)) => self.error(format!("Session lookup failed: {e}")),
            AppEvent::WorkoutsLoaded(Ok(list)) => {
                info!("fetched {} workouts", list.len());
                self.workouts = list;
                self.fetching = false;
            }
            AppEvent::WorkoutsLoaded(Err(e)) => {
                self.fetching = false;
                self.error(format!("Failed to load workouts: {e}"));
            }
            AppEvent::TypesLoaded(Ok(types)) => self.exercise_types = types,
            AppEvent::TypesLoaded(Err(e)) => {
                log::warn!("failed to load exercise catalog: {e}");
            }
            AppEvent::Submitted(Ok(_)) | AppEvent::Updated(Ok(())) => {
                self.dialog = None;
                self.toast("Workout saved");
                self.refresh();
            }
            AppEvent::Submitted(Err(e)) | AppEvent::Updated(Err(e)) => {
                // Keep the dialog open with the input intact so the user can
                // fix and resubmit.
                let message = e.to_string();
                match &mut self.dialog {
                    Some(dialog) => {
                        dialog.phase = DialogPhase::Editing;
                        dialog.error = Some(message);
                    }
                    None => self.error(format!("Failed to save workout: {message}")),
                }
            }
            AppEvent::Deleted(id, Ok(())) => {
                self.deleting = false;
                self.workouts.retain(|w| w.id != id);
                self.toast("Workout deleted");
            }
            AppEvent::Deleted(_, Err(e)) => {
                // The list stays as fetched; nothing was removed remotely.
                self.deleting = false;
                self.error(format!("Failed to delete workout: {e}"));
            }
            AppEvent::Imported(Ok(count)) => {
                self.importing = false;
                self.toast(format!("Imported {count} workouts"));
                self.refresh();
            }
            AppEvent::Imported(Err(e)) => {
                self.importing = false;
                self.error(format!("Import failed: {e}"));
            }
            AppEvent::SignedOut(Ok(())) => {
                self.session = None;
                self.workouts.clear();
                self.exercise_types.clear();
                self.toast("Signed out");
            }
            AppEvent::SignedOut(Err(e)) => self.error(format!("Sign out failed: {e}")),
        }
    }

    fn submit_payload(&mut self, dialog: &mut WorkoutDialog) {
        let Some(owner) = self.session.as_ref().map(|s| s.user_id.clone()) else {
            dialog.error = Some("Not signed in".into());
            return;
        };
        match dialog.payload(&owner) {
            Err(e) => dialog.error = Some(e.to_string()),
            Ok(payload) => {
                dialog.error = None;
                dialog.phase = DialogPhase::Submitting;
                let editing = dialog.editing.clone();
                self.spawn_request(move |client| match editing {
                    Some(id) if payload.kind == "gym" => {
                        AppEvent::Updated(client.update_gym_workout(&id, &payload))
                    }
                    Some(id) => AppEvent::Updated(client.update_workout(&id, &payload)),
                    None if payload.kind == "gym" => {
                        AppEvent::Submitted(client.create_gym_workout(&payload))
                    }
                    None => AppEvent::Submitted(client.create_workout(&payload)),
                });
            }
        }
    }

    fn open_edit_dialog(&mut self, id: &str) {
        if let Some(workout) = self.workouts.iter().find(|w| w.id == id) {
            self.dialog = Some(WorkoutDialog::edit(workout));
        }
    }

    fn show_dialog_window(&mut self, ctx: &egui::Context) {
        let Some(mut dialog) = self.dialog.take() else {
            return;
        };
        let types = self.exercise_types.clone();
        let mut submit = false;
        let mut open = true;
        let title = if dialog.editing.is_some() {
            "Edit Workout"
        } else {
            "Add Workout"
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                if dialog.editing.is_none() {
                    ui.horizontal(|ui| {
                        ui.selectable_value(&mut dialog.tab, FormTab::Gym, "Gym");
                        ui.selectable_value(&mut dialog.tab, FormTab::Run, "Run");
                    });
                    ui.separator();
                }

                ui.horizontal(|ui| {
                    ui.label("Date");
                    ui.add(DatePickerButton::new(&mut dialog.date));
                });

                match dialog.tab {
                    FormTab::Gym => {
                        egui::Grid::new("gym_form").num_columns(2).show(ui, |ui| {
                            ui.label("Exercise");
                            ui.text_edit_singleline(&mut dialog.gym.exercise);
                            ui.end_row();
                            ui.label("Muscle group");
                            egui::ComboBox::from_id_source("muscle_group")
                                .selected_text(
                                    dialog
                                        .gym
                                        .muscle_group
                                        .map(MuscleGroup::label)
                                        .unwrap_or("None"),
                                )
                                .show_ui(ui, |ui| {
                                    ui.selectable_value(&mut dialog.gym.muscle_group, None, "None");
                                    for group in ALL_MUSCLE_GROUPS {
                                        ui.selectable_value(
                                            &mut dialog.gym.muscle_group,
                                            Some(group),
                                            group.label(),
                                        );
                                    }
                                });
                            ui.end_row();
                            ui.label("Sets");
                            ui.text_edit_singleline(&mut dialog.gym.sets);
                            ui.end_row();
                            ui.label("Reps");
                            ui.text_edit_singleline(&mut dialog.gym.reps);
                            ui.end_row();
                            ui.label("Weight (kg)");
                            ui.text_edit_singleline(&mut dialog.gym.weight);
                            ui.end_row();
                            ui.label("Duration (min)");
                            ui.text_edit_singleline(&mut dialog.gym.duration);
                            ui.end_row();
                            ui.label("Calories");
                            ui.text_edit_singleline(&mut dialog.gym.calories);
                            ui.end_row();
                        });
                        let suggestions = forms::suggest_exercises(&types, &dialog.gym.exercise, 5);
                        if !suggestions.is_empty() {
                            ui.horizontal_wrapped(|ui| {
                                for name in suggestions {
                                    if ui.small_button(name).clicked() {
                                        dialog.gym.exercise = name.to_string();
                                        if dialog.gym.muscle_group.is_none() {
                                            dialog.gym.muscle_group = types
                                                .iter()
                                                .find(|t| t.name.eq_ignore_ascii_case(name))
                                                .and_then(|t| t.muscle_group.as_deref())
                                                .and_then(MuscleGroup::parse)
                                                .or_else(|| default_group_for(name));
                                        }
                                    }
                                }
                            });
                        }
                    }
                    FormTab::Run => {
                        egui::Grid::new("run_form").num_columns(2).show(ui, |ui| {
                            ui.label("Distance (km)");
                            ui.text_edit_singleline(&mut dialog.run.distance);
                            ui.end_row();
                            ui.label("Duration (min)");
                            ui.text_edit_singleline(&mut dialog.run.duration);
                            ui.end_row();
                            ui.label("Pace (m:ss per km)");
                            ui.text_edit_singleline(&mut dialog.run.pace);
                            ui.end_row();
                            ui.label("Calories");
                            ui.text_edit_singleline(&mut dialog.run.calories);
                            ui.end_row();
                        });
                    }
                }

                if let Some(error) = &dialog.error {
                    ui.colored_label(egui::Color32::RED, error);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let label = if dialog.is_submitting() {
                        "Saving..."
                    } else {
                        "Save"
                    };
                    if ui
                        .add_enabled(!dialog.is_submitting(), egui::Button::new(label))
                        .clicked()
                    {
                        submit = true;
                    }
                });
            });
        if !open {
            return;
        }
        if submit {
            self.submit_payload(&mut dialog);
        }
        self.dialog = Some(dialog);
    }

    fn show_delete_confirmation(&mut self, ctx: &egui::Context) {
        let Some(id) = self.pending_delete.clone() else {
            return;
        };
        let mut confirm = false;
        let mut cancel = false;
        egui::Window::new("Delete Workout")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Delete this workout? This cannot be undone.");
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    let label = if self.deleting { "Deleting..." } else { "Delete" };
                    if ui
                        .add_enabled(!self.deleting, egui::Button::new(label))
                        .clicked()
                    {
                        confirm = true;
                    }
                });
            });
        if cancel {
            self.pending_delete = None;
        }
        if confirm {
            // The confirmation closes as soon as the request is issued; the
            // outcome arrives as a toast.
            self.pending_delete = None;
            self.deleting = true;
            self.spawn_request(move |client| {
                let result = client.delete_workout(&id);
                AppEvent::Deleted(id, result)
            });
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }
        let mut open = true;
        let mut reconnect = false;
        egui::Window::new("Settings")
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                egui::Grid::new("settings_form").num_columns(2).show(ui, |ui| {
                    ui.label("Base URL");
                    if ui
                        .text_edit_singleline(&mut self.settings.base_url)
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                    ui.label("API key");
                    if ui
                        .add(
                            egui::TextEdit::singleline(&mut self.settings.api_key).password(true),
                        )
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                    ui.label("Access token");
                    if ui
                        .add(
                            egui::TextEdit::singleline(&mut self.settings.access_token)
                                .password(true),
                        )
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                    ui.label("Recent workouts");
                    if ui
                        .add(egui::DragValue::new(&mut self.settings.recent_limit).clamp_range(1..=10))
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                });
                ui.small("FITTRACK_API_KEY and FITTRACK_ACCESS_TOKEN override the stored values.");
                if ui.button("Reconnect").clicked() {
                    reconnect = true;
                }
            });
        self.show_settings = open;
        if reconnect {
            self.settings.save();
            self.settings_dirty = false;
            self.connect();
        }
    }

    fn header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Fitness Tracker");
                ui.separator();
                ui.selectable_value(&mut self.page, Page::Home, "Home");
                ui.selectable_value(&mut self.page, Page::Workouts, "Workouts");
                ui.selectable_value(&mut self.page, Page::Data, "Data");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let account = self
                        .session
                        .as_ref()
                        .map(|s| s.email.clone())
                        .unwrap_or_else(|| "Account".into());
                    ui.menu_button(account, |ui| {
                        if ui.button("Settings").clicked() {
                            self.show_settings = true;
                            ui.close_menu();
                        }
                        if self.session.is_some() && ui.button("Sign Out").clicked() {
                            self.spawn_request(|client| AppEvent::SignedOut(client.sign_out()));
                            ui.close_menu();
                        }
                    });
                });
            });
        });
    }

    fn home_page(&mut self, ui: &mut egui::Ui) {
        ui.columns(3, |cols| {
            cols[0].group(|ui| {
                ui.label("Total Workouts");
                ui.heading(aggregate::total_count(&self.workouts).to_string());
            });
            cols[1].group(|ui| {
                ui.label("Total Distance");
                ui.heading(format!(
                    "{:.1} km",
                    aggregate::total_distance_km(&self.workouts)
                ));
            });
            cols[2].group(|ui| {
                ui.label("Total Calories");
                ui.heading(format!("{} kcal", aggregate::total_calories(&self.workouts)));
            });
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Log Gym Workout").clicked() {
                self.dialog = Some(WorkoutDialog::add(FormTab::Gym));
            }
            if ui.button("Log Run").clicked() {
                self.dialog = Some(WorkoutDialog::add(FormTab::Run));
            }
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Activity");
            egui::ComboBox::from_id_source("chart_period")
                .selected_text(self.settings.chart_period.label())
                .show_ui(ui, |ui| {
                    for period in ALL_PERIODS {
                        if ui
                            .selectable_value(
                                &mut self.settings.chart_period,
                                period,
                                period.label(),
                            )
                            .changed()
                        {
                            self.settings_dirty = true;
                        }
                    }
                });
        });
        let series = aggregate::select_series(self.settings.chart_period, &self.workouts);
        let labels: Vec<&'static str> = series.iter().map(|(label, _)| *label).collect();
        let resp = Plot::new("activity_plot")
            .height(220.0)
            .x_axis_formatter(move |mark, _chars, _| {
                let idx = mark.value.round() as i64;
                if idx >= 0 && (mark.value - idx as f64).abs() < 0.25 {
                    labels
                        .get(idx as usize)
                        .map(|label| label.to_string())
                        .unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(chart::activity_bars(&series));
            });
        if ui.button("Save Chart").clicked() {
            self.capture_rect = Some(resp.response.rect);
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Screenshot);
        }

        let breakdown = aggregate::muscle_group_breakdown(&self.workouts);
        if !breakdown.is_empty() {
            ui.add_space(8.0);
            ui.label("Muscle Groups");
            Plot::new("muscle_group_plot")
                .height(180.0)
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    for bars in chart::muscle_group_bars(&breakdown) {
                        plot_ui.bar_chart(bars);
                    }
                });
        }

        ui.add_space(8.0);
        ui.label("Recent Workouts");
        let rows = aggregate::recent_view(&self.workouts, self.settings.recent_limit);
        if rows.is_empty() {
            ui.weak("No workouts yet. Log your first one above.");
        }
        let mut edit_id: Option<String> = None;
        let mut delete_id: Option<String> = None;
        for row in &rows {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.strong(&row.title);
                    ui.label(row.kind.label());
                    if let Some(group) = &row.group {
                        ui.label(group);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Delete").clicked() {
                            delete_id = Some(row.id.clone());
                        }
                        if ui.small_button("Edit").clicked() {
                            edit_id = Some(row.id.clone());
                        }
                    });
                });
                ui.horizontal(|ui| {
                    ui.weak(&row.date);
                    ui.label(&row.duration);
                    if let Some(distance) = &row.distance {
                        ui.label(distance);
                    }
                    ui.label(&row.calories);
                });
            });
        }
        if let Some(id) = edit_id {
            self.open_edit_dialog(&id);
        }
        if let Some(id) = delete_id {
            self.pending_delete = Some(id);
        }
    }

    fn workouts_page(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Workout History");
            let label = if self.fetching { "Refreshing..." } else { "Refresh" };
            if ui
                .add_enabled(!self.fetching, egui::Button::new(label))
                .clicked()
            {
                self.refresh();
            }
        });
        if self.workouts.is_empty() && !self.fetching {
            ui.weak("No workouts recorded yet.");
            return;
        }
        let workouts = self.workouts.clone();
        let mut edit_id: Option<String> = None;
        let mut delete_id: Option<String> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for w in &workouts {
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        ui.strong(w.title());
                        ui.label(w.kind().label());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("Delete").clicked() {
                                delete_id = Some(w.id.clone());
                            }
                            if ui.small_button("Edit").clicked() {
                                edit_id = Some(w.id.clone());
                            }
                        });
                    });
                    ui.horizontal(|ui| {
                        ui.weak(w.occurred_at.format("%d %b %Y").to_string());
                        ui.label(format!("{} min", w.duration_min));
                        match &w.details {
                            WorkoutDetails::Gym {
                                muscle_group,
                                sets,
                                reps,
                                weight_kg,
                                ..
                            } => {
                                if let Some(group) = muscle_group {
                                    ui.label(group_label(group));
                                }
                                if let (Some(sets), Some(reps)) = (sets, reps) {
                                    ui.label(format!("{sets} x {reps}"));
                                }
                                if let Some(kg) = weight_kg {
                                    ui.label(format!("{kg:.1} kg"));
                                }
                            }
                            WorkoutDetails::Run { distance_km, pace } => {
                                if let Some(d) = distance_km {
                                    ui.label(format!("{d:.1} km"));
                                }
                                if let Some(pace) = pace {
                                    ui.label(format!("{pace} /km"));
                                }
                            }
                        }
                        if let Some(kcal) = w.calories {
                            ui.label(format!("{kcal} kcal"));
                        }
                    });
                });
            }
        });
        if let Some(id) = edit_id {
            self.open_edit_dialog(&id);
        }
        if let Some(id) = delete_id {
            self.pending_delete = Some(id);
        }
    }

    fn data_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Data");
        ui.add_space(4.0);
        ui.label("Import");
        let label = if self.importing { "Importing..." } else { "Import CSV" };
        if ui
            .add_enabled(!self.importing, egui::Button::new(label))
            .clicked()
        {
            self.import_csv();
        }

        ui.add_space(8.0);
        ui.label("Export");
        ui.horizontal(|ui| {
            if ui.button("Workouts JSON").clicked() {
                if let Some(path) = FileDialog::new().add_filter("JSON", &["json"]).save_file() {
                    match export::save_workouts_json(&path, &self.workouts) {
                        Ok(()) => self.toast("Exported workouts"),
                        Err(e) => self.error(format!("Export failed: {e}")),
                    }
                }
            }
            if ui.button("Workouts CSV").clicked() {
                if let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).save_file() {
                    match export::save_workouts_csv(&path, &self.workouts) {
                        Ok(()) => self.toast("Exported workouts"),
                        Err(e) => self.error(format!("Export failed: {e}")),
                    }
                }
            }
            if ui.button("Summary JSON").clicked() {
                if let Some(path) = FileDialog::new().add_filter("JSON", &["json"]).save_file() {
                    match export::save_summary_json(&path, &self.workouts) {
                        Ok(()) => self.toast("Exported summary"),
                        Err(e) => self.error(format!("Export failed: {e}")),
                    }
                }
            }
            if ui.button("HTML Report").clicked() {
                if let Some(path) = FileDialog::new().add_filter("HTML", &["html"]).save_file() {
                    match report::export_html_report(
                        &path,
                        &self.workouts,
                        self.settings.chart_period,
                    ) {
                        Ok(()) => {
                            self.toast("Report exported");
                            if let Err(e) = open::that(&path) {
                                log::warn!("could not open report: {e}");
                            }
                        }
                        Err(e) => self.error(format!("Report failed: {e}")),
                    }
                }
            }
        });
    }

    fn import_csv(&mut self) {
        let Some(owner) = self.session.as_ref().map(|s| s.user_id.clone()) else {
            self.error("Sign in before importing");
            return;
        };
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).pick_file() else {
            return;
        };
        self.importing = true;
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = (|| -> Result<usize, ApiError> {
                let file = std::fs::File::open(&path)
                    .map_err(|e| ApiError::Transport(Box::new(e)))?;
                let payloads = export::import_workouts_csv(file, &owner)
                    .map_err(|e| ApiError::Transport(Box::new(e)))?;
                let mut created = 0;
                for payload in &payloads {
                    if payload.kind == "gym" {
                        client.create_gym_workout(payload)?;
                    } else {
                        client.create_workout(payload)?;
                    }
                    created += 1;
                }
                Ok(created)
            })();
            let _ = tx.send(AppEvent::Imported(result));
        });
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        if let Some((message, start)) = self.toast.clone() {
            if start.elapsed() < Duration::from_secs(3) {
                egui::Area::new(egui::Id::new("info_toast"))
                    .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(message);
                    });
            } else {
                self.toast = None;
            }
        }
        if let Some((message, start)) = self.error_toast.clone() {
            if start.elapsed() < Duration::from_secs(5) {
                egui::Area::new(egui::Id::new("error_toast"))
                    .anchor(egui::Align2::LEFT_BOTTOM, [10.0, -10.0])
                    .show(ctx, |ui| {
                        ui.colored_label(egui::Color32::RED, message);
                    });
            } else {
                self.error_toast = None;
            }
        }
    }
}

impl App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Handle screenshot results
        let mut shot: Option<std::sync::Arc<egui::ColorImage>> = None;
        ctx.input_mut(|i| {
            i.events.retain(|e| {
                if let egui::Event::Screenshot { image, .. } = e {
                    shot = Some(image.clone());
                    false
                } else {
                    true
                }
            });
        });
        if let Some(img) = shot {
            if let Some(rect) = self.capture_rect.take() {
                if let Some(path) = FileDialog::new().add_filter("PNG", &["png"]).save_file() {
                    if let Err(err) = save_chart_region(&img, rect, ctx.pixels_per_point(), &path) {
                        log::error!("failed to save chart: {err}");
                    }
                }
            }
        }

        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
        }

        self.header(ctx);
        egui::CentralPanel::default().show(ctx, |ui| match self.page {
            Page::Home => self.home_page(ui),
            Page::Workouts => self.workouts_page(ui),
            Page::Data => self.data_page(ui),
        });

        self.show_dialog_window(ctx);
        self.show_delete_confirmation(ctx);
        self.show_settings_window(ctx);
        self.show_toasts(ctx);

        let busy = self.fetching
            || self.deleting
            || self.importing
            || self.dialog.as_ref().is_some_and(WorkoutDialog::is_submitting);
        if busy {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Fitness Tracker Dashboard",
        options,
        Box::new(|_cc| Box::new(DashboardApp::default())),
    )
}
