//! Main application UI and state management.
//! Lists problems due on the review date, adds new problems and records graded attempts.

use chrono::{Days, NaiveDate};
use eframe::egui;
use problem_tracker::database::db;
use problem_tracker::export::json::{collect_exports, export_json_to_path, import_into, import_json};
use problem_tracker::models::problem::{join_tags, parse_tags};
use problem_tracker::models::{AttemptMetrics, Problem, Summary};
use rusqlite::Connection;
use std::fmt::Display;

/// Kind of the status line shown under the header
#[derive(Clone, Copy, Debug, PartialEq)]
enum MessageKind {
    Success,
    Error,
}

pub struct ProblemTrackerApp {
    conn: Connection,
    review_date: NaiveDate,

    due_problems: Vec<Problem>,
    summary: Summary,
    selected_problem: Option<i64>,

    new_title: String,
    new_url: String,
    new_tags: String,

    time_spent_input: String,
    hints_used_input: String,
    notes_input: String,

    message: Option<(MessageKind, String)>,
}

/// Renders an optional value, "-" when absent
fn none_to_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn grade_label(quality: i32) -> &'static str {
    match quality {
        0 => "0 - Blackout",
        1 => "1 - Wrong",
        2 => "2 - Wrong (familiar)",
        3 => "3 - Difficult",
        4 => "4 - Correct",
        _ => "5 - Perfect",
    }
}

impl eframe::App for ProblemTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| self.render_header(ui));
        egui::SidePanel::right("side")
            .resizable(false)
            .min_width(260.0)
            .show(ctx, |ui| {
                self.render_add_form(ui);
                ui.separator();
                self.render_summary(ui);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_due_list(ui);
            ui.separator();
            self.render_grade_panel(ui);
        });
    }
}

impl ProblemTrackerApp {
    pub fn new(conn: Connection, review_date: NaiveDate) -> Self {
        let mut app = Self {
            conn,
            review_date,
            due_problems: Vec::new(),
            summary: Summary::default(),
            selected_problem: None,
            new_title: String::new(),
            new_url: String::new(),
            new_tags: String::new(),
            time_spent_input: String::new(),
            hints_used_input: String::new(),
            notes_input: String::new(),
            message: None,
        };
        app.refresh();
        app
    }

    /// Reloads the due list and summary for the current review date
    fn refresh(&mut self) {
        match db::list_due_problems(self.review_date, &self.conn) {
            Ok(problems) => self.due_problems = problems,
            Err(e) => self.show_error(format!("Failed to load due problems: {}", e)),
        }
        match db::summary(self.review_date, &self.conn) {
            Ok(summary) => self.summary = summary,
            Err(e) => self.show_error(format!("Failed to load summary: {}", e)),
        }

        // Drop the selection once the problem is no longer due
        if let Some(id) = self.selected_problem {
            if !self.due_problems.iter().any(|p| p.id == id) {
                self.selected_problem = None;
            }
        }
    }

    fn show_error(&mut self, text: String) {
        tracing::warn!("{}", text);
        self.message = Some((MessageKind::Error, text));
    }

    fn show_success(&mut self, text: String) {
        self.message = Some((MessageKind::Success, text));
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Problem Tracker");
            ui.separator();
            ui.label(format!("Review date: {}", self.review_date.format("%Y-%m-%d")));

            if ui.button("Next Day").clicked() {
                self.next_day();
            }

            ui.separator();
            if ui.button("Export").clicked() {
                self.handle_export();
            }
            if ui.button("Import").clicked() {
                self.handle_import();
            }
        });

        if let Some((kind, text)) = &self.message {
            let color = match kind {
                MessageKind::Success => egui::Color32::DARK_GREEN,
                MessageKind::Error => egui::Color32::RED,
            };
            ui.colored_label(color, text.as_str());
        }
    }

    fn render_add_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add Problem");

        egui::Grid::new("add_form").num_columns(2).show(ui, |ui| {
            ui.label("Title:");
            ui.text_edit_singleline(&mut self.new_title);
            ui.end_row();

            ui.label("URL:");
            ui.text_edit_singleline(&mut self.new_url);
            ui.end_row();

            ui.label("Tags:");
            ui.add(egui::TextEdit::singleline(&mut self.new_tags).hint_text("dp, graphs"));
            ui.end_row();
        });

        if ui.button("Add").clicked() {
            self.handle_add();
        }
    }

    fn render_summary(&mut self, ui: &mut egui::Ui) {
        ui.heading("Summary");
        ui.label(format!("Problems: {}", self.summary.total_problems));
        ui.label(format!("Due: {}", self.summary.due_problems));
        ui.label(format!("Attempts: {}", self.summary.total_attempts));
        ui.label(format!("Lapses: {}", self.summary.lapses));
        ui.label(format!(
            "Average quality: {}",
            none_to_dash(self.summary.average_quality.map(|q| format!("{:.2}", q)))
        ));
    }

    fn render_due_list(&mut self, ui: &mut egui::Ui) {
        ui.heading(format!("Due Problems ({})", self.due_problems.len()));

        if self.due_problems.is_empty() {
            ui.label("Nothing due. Add a problem or move to the next day.");
            return;
        }

        // Deferred to avoid borrowing self.due_problems while mutating the selection
        let mut action_select: Option<i64> = None;

        egui::ScrollArea::vertical()
            .id_salt("due_list")
            .max_height(300.0)
            .show(ui, |ui| {
                egui::Grid::new("due_grid").striped(true).show(ui, |ui| {
                    for header in ["", "Title", "Tags", "EF", "Reps", "Interval", "Last q", "Due"] {
                        ui.strong(header);
                    }
                    ui.end_row();

                    for problem in &self.due_problems {
                        let is_selected = self.selected_problem == Some(problem.id);
                        if ui.selectable_label(is_selected, "Grade").clicked() {
                            action_select = Some(problem.id);
                        }
                        ui.hyperlink_to(problem.title.as_str(), &problem.url);
                        ui.label(if problem.tags.is_empty() {
                            "-".to_string()
                        } else {
                            join_tags(&problem.tags)
                        });
                        ui.label(format!("{:.2}", problem.review.ease_factor));
                        ui.label(problem.review.repetitions.to_string());
                        ui.label(problem.review.interval_days.to_string());
                        ui.label(none_to_dash(problem.last_quality));
                        ui.label(problem.review.next_review_date.to_string());
                        ui.end_row();
                    }
                });
            });

        if let Some(id) = action_select {
            self.selected_problem = Some(id);
        }
    }

    fn render_grade_panel(&mut self, ui: &mut egui::Ui) {
        let Some(problem) = self
            .selected_problem
            .and_then(|id| self.due_problems.iter().find(|p| p.id == id))
        else {
            ui.label("Select a problem to record an attempt");
            return;
        };

        let problem_id = problem.id;
        ui.heading(format!("Record Attempt: {}", problem.title));

        egui::Grid::new("attempt_form").num_columns(2).show(ui, |ui| {
            ui.label("Time spent (min):");
            ui.text_edit_singleline(&mut self.time_spent_input);
            ui.end_row();

            ui.label("Hints used:");
            ui.text_edit_singleline(&mut self.hints_used_input);
            ui.end_row();

            ui.label("Notes:");
            ui.text_edit_singleline(&mut self.notes_input);
            ui.end_row();
        });

        ui.add_space(10.0);
        ui.label("Rate your attempt:");

        let mut action_grade: Option<i32> = None;
        ui.horizontal(|ui| {
            for quality in 0..=2 {
                if ui.button(grade_label(quality)).clicked() {
                    action_grade = Some(quality);
                }
            }
        });
        ui.horizontal(|ui| {
            for quality in 3..=5 {
                if ui.button(grade_label(quality)).clicked() {
                    action_grade = Some(quality);
                }
            }
        });

        if let Some(quality) = action_grade {
            self.handle_grade(problem_id, quality);
        }
    }

    fn next_day(&mut self) {
        self.review_date = self
            .review_date
            .checked_add_days(Days::new(1))
            .unwrap_or(self.review_date);
        self.message = None;
        self.refresh();
    }

    fn handle_add(&mut self) {
        let tags = parse_tags(&self.new_tags);
        match db::add_problem(&self.new_title, &self.new_url, &tags, self.review_date, &self.conn) {
            Ok(_) => {
                self.new_title.clear();
                self.new_url.clear();
                self.new_tags.clear();
                self.show_success("Problem added.".to_string());
            }
            Err(e) => self.show_error(format!("Error: {}", e)),
        }
        self.refresh();
    }

    fn handle_grade(&mut self, problem_id: i64, quality: i32) {
        let metrics = AttemptMetrics::from_input(&self.time_spent_input, &self.hints_used_input);
        let notes = Some(self.notes_input.as_str());

        match db::grade_problem(
            problem_id,
            quality,
            &metrics,
            notes,
            self.review_date,
            &mut self.conn,
        ) {
            Ok(state) => {
                self.time_spent_input.clear();
                self.hints_used_input.clear();
                self.notes_input.clear();
                self.show_success(format!(
                    "Saved. Next review on {}",
                    state.next_review_date.format("%Y-%m-%d")
                ));
            }
            Err(e) => self.show_error(format!("Failed to save attempt: {}", e)),
        }
        self.refresh();
    }

    /// Exports all problems with history to a JSON file chosen by the user
    fn handle_export(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("problems.json")
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let result = collect_exports(&self.conn)
            .and_then(|exports| export_json_to_path(&exports, &path).map(|_| exports.len()));
        match result {
            Ok(count) => self.show_success(format!("Exported {} problems.", count)),
            Err(e) => self.show_error(format!("Export failed: {}", e)),
        }
    }

    /// Imports problems from a JSON file chosen by the user
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let result = import_json(&path)
            .and_then(|exports| import_into(&exports, self.review_date, &mut self.conn));
        match result {
            Ok(count) => self.show_success(format!("Imported {} problems.", count)),
            Err(e) => self.show_error(format!("Import failed: {}", e)),
        }
        self.refresh();
    }
}
