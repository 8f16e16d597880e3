use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{FetchError, LookupKind, StatsError};
use crate::metrics::{
    PlayerProfile, TeamSummary, lookup_player, player_names, player_profile, team_summary,
};
use crate::pipeline::LoadedSheet;
use crate::registry::{RegistryStore, SheetRegistry};
use crate::table::Table;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Player,
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Label,
    SheetId,
}

/// "Add game sheet" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSheetForm {
    pub label: String,
    pub sheet_id: String,
    pub field: FormField,
}

impl AddSheetForm {
    fn new() -> Self {
        Self {
            label: String::new(),
            sheet_id: String::new(),
            field: FormField::Label,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Label => &mut self.label,
            FormField::SheetId => &mut self.sheet_id,
        }
    }
}

pub struct AppState {
    pub view: View,
    pub registry: RegistryStore,
    pub sheet_index: usize,
    pub loaded: Option<LoadedSheet>,
    pub players: Vec<String>,
    pub selected_player: usize,
    pub last_error: Option<String>,
    pub form: Option<AddSheetForm>,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(registry: RegistryStore) -> Self {
        Self {
            view: View::Player,
            registry,
            sheet_index: 0,
            loaded: None,
            players: Vec::new(),
            selected_player: 0,
            last_error: None,
            form: None,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn sheets(&self) -> Arc<SheetRegistry> {
        self.registry.snapshot()
    }

    pub fn selected_label(&self) -> Option<String> {
        self.sheets()
            .get(self.sheet_index)
            .map(|(label, _)| label.to_string())
    }

    pub fn select_next_sheet(&mut self) -> bool {
        let total = self.sheets().len();
        if total < 2 {
            return false;
        }
        self.sheet_index = (self.sheet_index + 1) % total;
        true
    }

    pub fn select_prev_sheet(&mut self) -> bool {
        let total = self.sheets().len();
        if total < 2 {
            return false;
        }
        self.sheet_index = (self.sheet_index + total - 1) % total;
        true
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Player => View::Team,
            View::Team => View::Player,
        };
    }

    pub fn select_next_player(&mut self) {
        if self.selected_player + 1 < self.players.len() {
            self.selected_player += 1;
        }
    }

    pub fn select_prev_player(&mut self) {
        self.selected_player = self.selected_player.saturating_sub(1);
    }

    pub fn selected_player_name(&self) -> Option<&str> {
        self.players.get(self.selected_player).map(String::as_str)
    }

    /// The loaded table, or an empty one after a failed load.
    pub fn table(&self) -> Table {
        self.loaded
            .as_ref()
            .map(|l| l.table.clone())
            .unwrap_or_default()
    }

    pub fn player_profile(&self) -> Option<PlayerProfile> {
        let loaded = self.loaded.as_ref()?;
        let name = self.selected_player_name()?;
        match lookup_player(&loaded.table, name) {
            Ok(record) => Some(player_profile(&record)),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    pub fn team_summary(&self) -> TeamSummary {
        match &self.loaded {
            Some(loaded) => team_summary(&loaded.table),
            None => team_summary(&Table::empty()),
        }
    }

    /// Installs the outcome of a load. Errors leave an empty table behind.
    pub fn apply_load(&mut self, result: Result<LoadedSheet, StatsError>) {
        match result {
            Ok(loaded) => {
                let previous = self.selected_player_name().map(str::to_string);
                self.players = player_names(&loaded.table);
                self.selected_player = previous
                    .and_then(|name| self.players.iter().position(|p| *p == name))
                    .unwrap_or(0);
                if !loaded.report.missing.is_empty() {
                    self.push_log(format!(
                        "[WARN] Missing columns: {}",
                        loaded.report.missing.join(", ")
                    ));
                }
                self.push_log(format!(
                    "[INFO] Loaded {} ({} players)",
                    loaded.label,
                    self.players.len()
                ));
                self.last_error = None;
                self.loaded = Some(loaded);
            }
            Err(err) => {
                let message = error_message(&err);
                self.push_log(format!("[WARN] {message}"));
                self.last_error = Some(message);
                self.loaded = None;
                self.players.clear();
                self.selected_player = 0;
            }
        }
    }

    pub fn open_form(&mut self) {
        self.form = Some(AddSheetForm::new());
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
    }

    pub fn form_input(&mut self, ch: char) {
        if let Some(form) = self.form.as_mut() {
            form.active_mut().push(ch);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.active_mut().pop();
        }
    }

    pub fn form_next_field(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.field = match form.field {
                FormField::Label => FormField::SheetId,
                FormField::SheetId => FormField::Label,
            };
        }
    }

    /// Appends the form's sheet and selects it. Returns the new label.
    pub fn submit_form(&mut self) -> Option<String> {
        let form = self.form.as_ref()?;
        let label = form.label.trim().to_string();
        let sheet_id = form.sheet_id.trim().to_string();
        if label.is_empty() || sheet_id.is_empty() {
            self.push_log("[WARN] Game name and spreadsheet id are both required");
            return None;
        }
        self.form = None;

        let snapshot = self.registry.append(&label, &sheet_id, None);
        self.sheet_index = snapshot
            .labels()
            .iter()
            .position(|l| *l == label)
            .unwrap_or(0);
        self.push_log(format!("[INFO] Added {label}"));
        Some(label)
    }
}

/// User-facing text for each error kind.
pub fn error_message(err: &StatsError) -> String {
    match err {
        StatsError::Fetch(FetchError::Auth { sheet_id, .. }) => format!(
            "Access denied for sheet {sheet_id}; check the configured Google credential"
        ),
        StatsError::Fetch(FetchError::Credential(message)) => {
            format!("Could not sign in with the service account: {message}")
        }
        StatsError::Fetch(FetchError::NotFound { sheet_id }) => {
            format!("Spreadsheet {sheet_id} does not exist")
        }
        StatsError::Fetch(FetchError::BadRange { range, .. }) => {
            format!("Range {range} is not valid for this sheet")
        }
        StatsError::Fetch(other) => format!("Error loading data: {other}"),
        StatsError::NotFound {
            kind: LookupKind::Sheet,
            name,
        } => format!("No sheet registered as {name}"),
        StatsError::NotFound { kind, name } => format!("No {kind} named {name}"),
    }
}
