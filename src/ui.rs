use crate::aggregate::{self, TaskListing, TaskQuery, TaskStats};
use crate::calendar::{self, CalendarGrid, DueStatus, MonthCursor};
use crate::dates;
use crate::model::{
    Category, CategoryColor, Priority, ProfileDraft, SettingKind, SettingsPatch, Task, TaskDraft,
    TaskId, TaskPatch,
};
use crate::state::AppState;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::subscriber::NoSubscriber;

const CELL_WIDTH: usize = 10;

pub fn run(state: AppState) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(state);
    // log lines would tear the alternate screen
    let result = tracing::subscriber::with_default(NoSubscriber::default(), || {
        app.event_loop(&mut terminal)
    });
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    state: AppState,
    today: NaiveDate,
    view: View,
    mode: Mode,
    status: String,
    category_idx: usize,
    dashboard_idx: usize,
    query: TaskQuery,
    tasks_idx: usize,
    month: MonthCursor,
    upcoming_idx: usize,
    settings_idx: usize,
    notification_idx: usize,
}

enum Mode {
    Normal,
    Searching,
    Notifications,
    Adding(TaskForm),
    Editing { task_id: TaskId, form: TaskForm },
    EditingProfile(ProfileForm),
    ConfirmDelete { task_id: TaskId },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum View {
    Dashboard,
    Tasks,
    Calendar,
    Settings,
}

struct TaskForm {
    title: FieldValue,
    description: FieldValue,
    category_idx: usize,
    priority: Priority,
    due: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Title,
    Description,
    Category,
    Priority,
    Due,
}

struct ProfileForm {
    name: FieldValue,
    email: FieldValue,
    avatar: FieldValue,
    field: ProfileField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ProfileField {
    Name,
    Email,
    Avatar,
}

/// Single-line text input with a byte-offset cursor kept on char boundaries.
#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        self.cursor = prev_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        self.cursor = next_boundary(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl View {
    const ALL: [View; 4] = [View::Dashboard, View::Tasks, View::Calendar, View::Settings];

    fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Tasks => "My Tasks",
            View::Calendar => "Calendar",
            View::Settings => "Settings",
        }
    }

    fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }
}

impl TaskForm {
    fn new() -> Self {
        TaskForm {
            title: FieldValue::new(""),
            description: FieldValue::new(""),
            category_idx: 0,
            priority: Priority::Medium,
            due: FieldValue::new(""),
            field: FormField::Title,
        }
    }

    fn from_task(task: &Task, categories: &[&Category]) -> Self {
        TaskForm {
            title: FieldValue::new(&task.title),
            description: FieldValue::new(task.description.as_deref().unwrap_or_default()),
            category_idx: categories
                .iter()
                .position(|c| c.id == task.category_id)
                .unwrap_or(0),
            priority: task.priority,
            due: FieldValue::new(
                &task
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            field: FormField::Title,
        }
    }

    fn draft(&self, categories: &[&Category]) -> TaskDraft {
        TaskDraft {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            category_id: categories
                .get(self.category_idx)
                .map(|c| c.id.clone())
                .unwrap_or_default(),
            priority: self.priority,
            due_date: self.due.value.clone(),
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Category,
            FormField::Category => FormField::Priority,
            FormField::Priority => FormField::Due,
            FormField::Due => FormField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Due,
            FormField::Description => FormField::Title,
            FormField::Category => FormField::Description,
            FormField::Priority => FormField::Category,
            FormField::Due => FormField::Priority,
        };
    }

    fn active_text_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Due => Some(&mut self.due),
            FormField::Category | FormField::Priority => None,
        }
    }

    fn cycle_choice(&mut self, forward: bool, category_count: usize) {
        match self.field {
            FormField::Category if category_count > 0 => {
                self.category_idx = if forward {
                    (self.category_idx + 1) % category_count
                } else {
                    (self.category_idx + category_count - 1) % category_count
                };
            }
            FormField::Priority => {
                self.priority = if forward {
                    self.priority.next()
                } else {
                    self.priority.next().next()
                };
            }
            _ => {}
        }
    }
}

impl ProfileForm {
    fn from_draft(draft: ProfileDraft) -> Self {
        ProfileForm {
            name: FieldValue::new(&draft.name),
            email: FieldValue::new(&draft.email),
            avatar: FieldValue::new(&draft.avatar),
            field: ProfileField::Name,
        }
    }

    fn draft(&self) -> ProfileDraft {
        ProfileDraft {
            name: self.name.value.clone(),
            email: self.email.value.clone(),
            avatar: self.avatar.value.clone(),
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            ProfileField::Name => ProfileField::Email,
            ProfileField::Email => ProfileField::Avatar,
            ProfileField::Avatar => ProfileField::Name,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            ProfileField::Name => ProfileField::Avatar,
            ProfileField::Email => ProfileField::Name,
            ProfileField::Avatar => ProfileField::Email,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            ProfileField::Name => &mut self.name,
            ProfileField::Email => &mut self.email,
            ProfileField::Avatar => &mut self.avatar,
        }
    }
}

impl App {
    fn new(state: AppState) -> Self {
        let today = dates::today();
        let status = format!(
            "Welcome back, {}. {} tasks loaded",
            state.user().name,
            state.tasks().len()
        );
        App {
            state,
            today,
            view: View::Dashboard,
            mode: Mode::Normal,
            status,
            category_idx: 0,
            dashboard_idx: 0,
            query: TaskQuery::new(),
            tasks_idx: 0,
            month: MonthCursor::containing(today),
            upcoming_idx: 0,
            settings_idx: 0,
            notification_idx: 0,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.today = dates::today();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Searching => self.handle_search_key(key),
            Mode::Notifications => self.handle_notification_key(key),
            Mode::Adding(_) | Mode::Editing { .. } => self.handle_task_form_key(key),
            Mode::EditingProfile(_) => self.handle_profile_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
        self.clamp_selections();
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.set_view(View::ALL[idx]);
            }
            KeyCode::Tab => self.set_view(self.view.next()),
            KeyCode::Char('n') => {
                self.mode = Mode::Notifications;
                self.notification_idx = 0;
            }
            KeyCode::Char('a') if self.view != View::Settings => {
                self.mode = Mode::Adding(TaskForm::new());
                self.status = "New task (Tab moves, ←/→ change choices, Enter saves)".into();
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Char(' ') if self.view != View::Settings => self.toggle_selected(),
            KeyCode::Char('e') if self.view != View::Settings => self.open_edit_form(),
            KeyCode::Char('d') if self.view != View::Settings => {
                match self.selected_task_id() {
                    Some(task_id) => self.mode = Mode::ConfirmDelete { task_id },
                    None => self.status = "No task selected".into(),
                }
            }
            _ => match self.view {
                View::Dashboard => self.handle_dashboard_key(key),
                View::Tasks => self.handle_tasks_key(key),
                View::Calendar => self.handle_calendar_key(key),
                View::Settings => self.handle_settings_key(key),
            },
        }
        self.clamp_selections();
        false
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        let count = self.state.categories().len();
        if count == 0 {
            return;
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.category_idx = (self.category_idx + count - 1) % count;
                self.dashboard_idx = 0;
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.category_idx = (self.category_idx + 1) % count;
                self.dashboard_idx = 0;
            }
            _ => {}
        }
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('/') => {
                self.mode = Mode::Searching;
                self.status = "Type to search, Enter to keep, Esc to clear".into();
            }
            KeyCode::Char('p') => {
                self.query.priority = self.query.priority.cycle();
                self.tasks_idx = 0;
                self.status = format!("Priority filter: {}", self.query.priority.label());
            }
            KeyCode::Char('s') => {
                self.query.sort = self.query.sort.cycle();
                self.status = format!("Sorted by {}", self.query.sort.label());
            }
            _ => {}
        }
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.month = self.month.previous(),
            KeyCode::Right | KeyCode::Char('l') => self.month = self.month.next(),
            KeyCode::Char('t') => self.month = MonthCursor::containing(self.today),
            _ => return,
        }
        self.status = self.month.label();
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let kind = SettingKind::ALL[self.settings_idx.min(SettingKind::ALL.len() - 1)];
                let patch = SettingsPatch::toggle(self.state.settings(), kind);
                self.state.update_notification_settings(patch);
                self.status = format!(
                    "{} {}",
                    kind.label(),
                    if self.state.settings().get(kind) { "on" } else { "off" }
                );
            }
            KeyCode::Char('e') => {
                let draft = ProfileDraft::from_user(self.state.user());
                self.mode = Mode::EditingProfile(ProfileForm::from_draft(draft));
                self.status = "Editing profile (Tab moves, Enter saves, Esc cancels)".into();
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.status = format!("{} matching tasks", self.tasks_listing().len());
            }
            KeyCode::Esc => {
                self.query.search.clear();
                self.mode = Mode::Normal;
                self.status = "Search cleared".into();
            }
            KeyCode::Backspace => {
                self.query.search.pop();
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.query.search.push(c);
                self.tasks_idx = 0;
            }
            _ => {}
        }
    }

    fn handle_notification_key(&mut self, key: KeyEvent) {
        let selected = self
            .state
            .notifications()
            .get(self.notification_idx)
            .map(|n| n.id.clone());
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => self.mode = Mode::Normal,
            KeyCode::Up | KeyCode::Char('k') => {
                self.notification_idx = self.notification_idx.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => self.notification_idx += 1,
            KeyCode::Char('r') | KeyCode::Enter => {
                if let Some(id) = selected {
                    self.state.mark_notification_read(&id);
                }
            }
            KeyCode::Char('R') => {
                if self.state.mark_all_notifications_read() {
                    self.status = "All notifications marked as read".into();
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = selected {
                    self.state.delete_notification(&id);
                }
            }
            _ => {}
        }
    }

    fn handle_task_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let close = match &mut mode {
            Mode::Adding(form) => self.process_task_form_key(None, form, key),
            Mode::Editing { task_id, form } => {
                let id = task_id.clone();
                self.process_task_form_key(Some(id), form, key)
            }
            _ => true,
        };
        if !close {
            self.mode = mode;
        }
    }

    fn process_task_form_key(
        &mut self,
        editing: Option<TaskId>,
        form: &mut TaskForm,
        key: KeyEvent,
    ) -> bool {
        let category_count = self.state.assignable_categories().count();
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return true;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Enter => return self.submit_task_form(editing, form),
            KeyCode::Left => match form.active_text_mut() {
                Some(field) => field.move_left(),
                None => form.cycle_choice(false, category_count),
            },
            KeyCode::Right => match form.active_text_mut() {
                Some(field) => field.move_right(),
                None => form.cycle_choice(true, category_count),
            },
            KeyCode::Backspace => {
                if let Some(field) = form.active_text_mut() {
                    field.backspace();
                }
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                match form.active_text_mut() {
                    Some(field) => field.insert_char(c),
                    None if c == ' ' => form.cycle_choice(true, category_count),
                    None => {}
                }
            }
            _ => {}
        }
        false
    }

    fn submit_task_form(&mut self, editing: Option<TaskId>, form: &TaskForm) -> bool {
        let categories: Vec<&Category> = self.state.assignable_categories().collect();
        let new = match form.draft(&categories).validate(self.state.categories()) {
            Ok(new) => new,
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                return false;
            }
        };
        match editing {
            None => {
                let title = new.title.clone();
                self.state.add_task(new);
                self.status = format!("Added \"{}\"", title);
            }
            Some(task_id) => {
                let patch = TaskPatch {
                    title: Some(new.title),
                    description: Some(new.description),
                    completed: None,
                    category_id: Some(new.category_id),
                    priority: Some(new.priority),
                    due_date: Some(new.due_date),
                };
                self.status = if self.state.update_task(&task_id, patch) {
                    "Task updated".into()
                } else {
                    "No changes".into()
                };
            }
        }
        true
    }

    fn handle_profile_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let close = match &mut mode {
            Mode::EditingProfile(form) => match key.code {
                KeyCode::Esc => {
                    self.status = "Canceled".into();
                    true
                }
                KeyCode::Tab | KeyCode::Down => {
                    form.next_field();
                    false
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.prev_field();
                    false
                }
                KeyCode::Left => {
                    form.active_field_mut().move_left();
                    false
                }
                KeyCode::Right => {
                    form.active_field_mut().move_right();
                    false
                }
                KeyCode::Backspace => {
                    form.active_field_mut().backspace();
                    false
                }
                KeyCode::Enter => match form.draft().validate() {
                    Ok(patch) => {
                        self.state.update_user(patch);
                        self.status = "Profile saved".into();
                        true
                    }
                    Err(err) => {
                        self.status = format!("Could not save: {}", err);
                        false
                    }
                },
                KeyCode::Char(c) => {
                    form.active_field_mut().insert_char(c);
                    false
                }
                _ => false,
            },
            _ => true,
        };
        if !close {
            self.mode = mode;
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let task_id = match &self.mode {
            Mode::ConfirmDelete { task_id } => task_id.clone(),
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.status = if self.state.delete_task(&task_id) {
                    "Task deleted".into()
                } else {
                    "Task already gone".into()
                };
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.status = format!("{} view", view.label());
        }
    }

    fn open_edit_form(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            self.status = "No task selected to edit".into();
            return;
        };
        let categories: Vec<&Category> = self.state.assignable_categories().collect();
        if let Some(task) = self.state.task(&task_id) {
            let form = TaskForm::from_task(task, &categories);
            self.status = format!("Editing \"{}\"", task.title);
            self.mode = Mode::Editing { task_id, form };
        }
    }

    fn toggle_selected(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        if self.state.toggle_task(&task_id) {
            if let Some(task) = self.state.task(&task_id) {
                self.status = if task.completed {
                    format!("Completed \"{}\"", task.title)
                } else {
                    format!("Reopened \"{}\"", task.title)
                };
            }
        }
    }

    fn selected_category_id(&self) -> String {
        self.state
            .categories()
            .get(self.category_idx)
            .map(|c| c.id.clone())
            .unwrap_or_else(|| crate::model::ALL_CATEGORY_ID.to_string())
    }

    fn dashboard_listing(&self) -> TaskListing<'_> {
        TaskQuery::new()
            .with_category(self.selected_category_id())
            .apply(self.state.tasks())
    }

    fn tasks_listing(&self) -> TaskListing<'_> {
        self.query.apply(self.state.tasks())
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        match self.view {
            View::Dashboard => self
                .dashboard_listing()
                .iter()
                .nth(self.dashboard_idx)
                .map(|t| t.id.clone()),
            View::Tasks => self
                .tasks_listing()
                .iter()
                .nth(self.tasks_idx)
                .map(|t| t.id.clone()),
            View::Calendar => calendar::upcoming_tasks(self.state.tasks(), self.today)
                .get(self.upcoming_idx)
                .map(|u| u.task.id.clone()),
            View::Settings => None,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let idx = match self.view {
            View::Dashboard => &mut self.dashboard_idx,
            View::Tasks => &mut self.tasks_idx,
            View::Calendar => &mut self.upcoming_idx,
            View::Settings => &mut self.settings_idx,
        };
        *idx = idx.saturating_add_signed(delta);
    }

    fn clamp_selections(&mut self) {
        let clamp = |idx: usize, len: usize| idx.min(len.saturating_sub(1));
        self.dashboard_idx = clamp(self.dashboard_idx, self.dashboard_listing().len());
        self.tasks_idx = clamp(self.tasks_idx, self.tasks_listing().len());
        self.upcoming_idx = clamp(
            self.upcoming_idx,
            calendar::upcoming_tasks(self.state.tasks(), self.today).len(),
        );
        self.settings_idx = clamp(self.settings_idx, SettingKind::ALL.len());
        self.notification_idx = clamp(self.notification_idx, self.state.notifications().len());
        self.category_idx = clamp(self.category_idx, self.state.categories().len());
    }

    fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());
        self.draw_header(f, layout[0]);
        match self.view {
            View::Dashboard => self.draw_dashboard(f, layout[1]),
            View::Tasks => self.draw_tasks(f, layout[1]),
            View::Calendar => self.draw_calendar(f, layout[1]),
            View::Settings => self.draw_settings(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Notifications => self.draw_notifications(f),
            Mode::Adding(form) => self.draw_task_form(f, "New Task", form),
            Mode::Editing { form, .. } => self.draw_task_form(f, "Edit Task", form),
            Mode::EditingProfile(form) => self.draw_profile_form(f, form),
            Mode::ConfirmDelete { task_id } => self.draw_confirm(f, task_id),
            Mode::Normal | Mode::Searching => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let unread = aggregate::unread_count(self.state.notifications());
        let titles: Vec<Line<'static>> = View::ALL
            .iter()
            .enumerate()
            .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.label())))
            .collect();
        let bell = if unread > 0 {
            format!(" 🔔 {} ", unread)
        } else {
            " 🔔 ".to_string()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" TaskPro · {} ", self.today.format("%A, %B %-d")),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .title(
                ratatui::widgets::block::Title::from(Span::styled(
                    format!("{}· {} ", bell, self.state.user().name),
                    Style::default().fg(if unread > 0 {
                        Color::LightBlue
                    } else {
                        Color::Gray
                    }),
                ))
                .alignment(Alignment::Right),
            );
        let tabs = Tabs::new(titles)
            .select(self.view.index())
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("│");
        f.render_widget(tabs, area);
    }

    fn draw_dashboard(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
            ])
            .split(area);

        let stats = TaskStats::compute(self.state.tasks(), self.today);
        let stat_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(sections[0]);
        let gauge = Gauge::default()
            .block(Block::default().title("Completed").borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::LightBlue))
            .percent(u16::from(stats.completion_rate))
            .label(format!(
                "{}/{} · {}%",
                stats.completed, stats.total, stats.completion_rate
            ));
        f.render_widget(gauge, stat_row[0]);
        let counts = Line::from(vec![
            Span::styled("Active ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.pending.to_string(),
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled("Due today ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.due_today.to_string(),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled("Total ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.total.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        f.render_widget(
            Paragraph::new(counts).block(Block::default().title("Overview").borders(Borders::ALL)),
            stat_row[1],
        );

        let mut chips = Vec::new();
        for (idx, (category, count)) in
            aggregate::category_counts(self.state.tasks(), self.state.categories())
                .into_iter()
                .enumerate()
        {
            let base = category_color(category.color);
            let style = if idx == self.category_idx {
                Style::default()
                    .bg(base)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(base)
            };
            chips.push(Span::styled(format!(" {} {} ", category.name, count), style));
            chips.push(Span::raw(" "));
        }
        f.render_widget(
            Paragraph::new(Line::from(chips))
                .block(Block::default().title("Categories (←/→)").borders(Borders::ALL)),
            sections[1],
        );

        let listing = self.dashboard_listing();
        self.draw_listing(f, sections[2], &listing, self.dashboard_idx, "Pending");
    }

    fn draw_tasks(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(4)])
            .split(area);
        let searching = matches!(self.mode, Mode::Searching);
        let search_text = if searching {
            format!("{}▌", self.query.search)
        } else if self.query.search.is_empty() {
            "(/ to search)".to_string()
        } else {
            self.query.search.clone()
        };
        let bar = Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Gray)),
            Span::styled(
                search_text,
                Style::default().fg(if searching { Color::Cyan } else { Color::White }),
            ),
            Span::raw("   "),
            Span::styled("Priority: ", Style::default().fg(Color::Gray)),
            Span::styled(self.query.priority.label(), Style::default().fg(Color::LightYellow)),
            Span::raw("   "),
            Span::styled("Sort: ", Style::default().fg(Color::Gray)),
            Span::styled(self.query.sort.label(), Style::default().fg(Color::LightYellow)),
        ]);
        f.render_widget(
            Paragraph::new(bar).block(Block::default().title("Filters").borders(Borders::ALL)),
            sections[0],
        );
        let listing = self.tasks_listing();
        self.draw_listing(f, sections[1], &listing, self.tasks_idx, "Active");
    }

    /// Active and completed halves stacked; `selected` indexes active tasks
    /// first, then completed ones.
    fn draw_listing(
        &self,
        f: &mut ratatui::Frame<'_>,
        area: Rect,
        listing: &TaskListing<'_>,
        selected: usize,
        active_title: &str,
    ) {
        if listing.is_empty() {
            let empty = Paragraph::new("No tasks found")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, area);
            return;
        }
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        let active_len = listing.active.len();
        let (active_sel, completed_sel) = if selected < active_len {
            (Some(selected), None)
        } else {
            (None, Some(selected - active_len))
        };
        self.draw_task_list(
            f,
            halves[0],
            format!("{} ({})", active_title, active_len),
            &listing.active,
            active_sel,
        );
        self.draw_task_list(
            f,
            halves[1],
            format!("Completed ({})", listing.completed.len()),
            &listing.completed,
            completed_sel,
        );
    }

    fn draw_task_list(
        &self,
        f: &mut ratatui::Frame<'_>,
        area: Rect,
        title: String,
        tasks: &[&Task],
        selected: Option<usize>,
    ) {
        let items: Vec<ListItem<'static>> = tasks
            .iter()
            .map(|task| task_item(task, self.state.categories(), self.today))
            .collect();
        let mut state = ListState::default();
        state.select(selected);
        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default().add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(if selected.is_some() {
                        Color::Cyan
                    } else {
                        Color::DarkGray
                    })),
            )
            .highlight_symbol("▶ ")
            .highlight_style(Style::default().bg(Color::DarkGray));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(CELL_WIDTH as u16 * 7 + 2), Constraint::Min(20)])
            .split(area);
        let grid = CalendarGrid::build(self.month, self.state.tasks(), self.today);

        let mut lines = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.month.label(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
        ]));
        let headings = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        lines.push(Line::from(
            headings
                .iter()
                .map(|h| Span::styled(pad_cell(h), Style::default().fg(Color::Gray)))
                .collect::<Vec<_>>(),
        ));

        for week in grid.weeks() {
            let mut numbers = Vec::new();
            let mut first = Vec::new();
            let mut second = Vec::new();
            let mut more = Vec::new();
            let has_overflow = week.iter().flatten().any(|c| c.overflow().is_some());
            for slot in &week {
                let Some(cell) = slot else {
                    for row in [&mut numbers, &mut first, &mut second, &mut more] {
                        row.push(Span::raw(pad_cell("")));
                    }
                    continue;
                };
                let number_style = if cell.is_today {
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else if cell.tasks.is_empty() {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default()
                        .fg(Color::LightYellow)
                        .add_modifier(Modifier::BOLD)
                };
                numbers.push(Span::styled(pad_cell(&format!("{:>2}", cell.day)), number_style));
                let visible = cell.visible_tasks();
                first.push(self.task_chip(visible.first().copied()));
                second.push(self.task_chip(visible.get(1).copied()));
                more.push(match cell.overflow() {
                    Some(hidden) => Span::styled(
                        pad_cell(&format!("+{} more", hidden)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    None => Span::raw(pad_cell("")),
                });
            }
            lines.push(Line::from(numbers));
            lines.push(Line::from(first));
            lines.push(Line::from(second));
            if has_overflow {
                lines.push(Line::from(more));
            }
        }
        if let Some(cell) = grid.today() {
            lines.push(Line::from(Span::styled(
                format!("Today: {} due", cell.tasks.len()),
                Style::default().fg(Color::LightBlue),
            )));
        }
        let month_view = Paragraph::new(lines).block(
            Block::default()
                .title("Calendar (h/l month, t today)")
                .borders(Borders::ALL),
        );
        f.render_widget(month_view, columns[0]);

        let upcoming = calendar::upcoming_tasks(self.state.tasks(), self.today);
        let items: Vec<ListItem<'static>> = upcoming
            .iter()
            .map(|entry| {
                let (label, color) = match entry.status {
                    DueStatus::Overdue => ("Overdue", Color::LightRed),
                    DueStatus::DueToday => ("Today", Color::Rgb(255, 165, 0)),
                    DueStatus::Upcoming(priority) => (priority.label(), priority_color(priority)),
                };
                let dot = match entry.status {
                    DueStatus::Upcoming(_) => dates::category_for(entry.task, self.state.categories())
                        .map(|c| category_color(c.color))
                        .unwrap_or(Color::Gray),
                    _ => color,
                };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled("● ", Style::default().fg(dot)),
                        Span::styled(entry.task.title.clone(), Style::default().fg(Color::White)),
                    ]),
                    Line::from(vec![
                        Span::raw("  "),
                        Span::styled(
                            dates::format_short_date(entry.due),
                            Style::default().fg(Color::Gray),
                        ),
                        Span::raw("  "),
                        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    ]),
                ])
            })
            .collect();
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(self.upcoming_idx));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(
                        "Upcoming ({})",
                        calendar::upcoming_total(self.state.tasks())
                    ))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));
        f.render_stateful_widget(list, columns[1], &mut state);
    }

    fn task_chip(&self, task: Option<&Task>) -> Span<'static> {
        let Some(task) = task else {
            return Span::raw(pad_cell(""));
        };
        let color = dates::category_for(task, self.state.categories())
            .map(|c| category_color(c.color))
            .unwrap_or(Color::Gray);
        let mut style = Style::default().fg(color);
        if task.completed {
            style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
        }
        Span::styled(
            pad_cell(&truncate_text(&task.title, CELL_WIDTH - 1)),
            style,
        )
    }

    fn draw_settings(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(5)])
            .split(area);
        let user = self.state.user();
        let profile = vec![
            Line::from(vec![
                Span::styled("Name    ", Style::default().fg(Color::Gray)),
                Span::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(vec![
                Span::styled("Email   ", Style::default().fg(Color::Gray)),
                Span::raw(user.email.clone()),
            ]),
            Line::from(vec![
                Span::styled("Avatar  ", Style::default().fg(Color::Gray)),
                Span::styled(user.avatar.clone(), Style::default().fg(Color::DarkGray)),
            ]),
        ];
        f.render_widget(
            Paragraph::new(profile)
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Profile (e to edit)").borders(Borders::ALL)),
            sections[0],
        );

        let settings = self.state.settings();
        let items: Vec<ListItem<'static>> = SettingKind::ALL
            .iter()
            .map(|kind| {
                let on = settings.get(*kind);
                ListItem::new(Line::from(vec![
                    Span::styled(
                        if on { "[on ] " } else { "[off] " },
                        Style::default().fg(if on { Color::LightGreen } else { Color::DarkGray }),
                    ),
                    Span::raw(kind.label()),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.settings_idx));
        let list = List::new(items)
            .block(
                Block::default()
                    .title("Notifications (space to toggle)")
                    .borders(Borders::ALL),
            )
            .highlight_symbol("▶ ")
            .highlight_style(Style::default().add_modifier(Modifier::BOLD));
        f.render_stateful_widget(list, sections[1], &mut state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.view {
            View::Dashboard => "←/→ category · j/k select · space toggle · e edit · d delete · a add",
            View::Tasks => "/ search · p priority · s sort · space toggle · e edit · d delete · a add",
            View::Calendar => "h/l month · t today · j/k select · space toggle · e edit · a add",
            View::Settings => "j/k select · space toggle · e edit profile",
        };
        let lines = vec![
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(Color::White),
            )),
            Line::from(Span::styled(
                format!("{} · n notifications · 1-4/Tab views · q quit", help),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::TOP)),
            area,
        );
    }

    fn draw_notifications(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(70, 70, f.size());
        let now = Utc::now();
        let notifications = self.state.notifications();
        let unread = aggregate::unread_count(notifications);
        let block = Block::default()
            .title(Span::styled(
                format!("Notifications ({} unread)", unread),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .title(
                ratatui::widgets::block::Title::from("r read · R read all · x delete · Esc close")
                    .position(ratatui::widgets::block::Position::Bottom),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(Clear, area);
        if notifications.is_empty() {
            f.render_widget(
                Paragraph::new("You're all caught up")
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
            return;
        }
        let items: Vec<ListItem<'static>> = notifications
            .iter()
            .map(|n| {
                let title_style = if n.read {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD)
                };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(
                            if n.read { "  " } else { "● " },
                            Style::default().fg(Color::LightBlue),
                        ),
                        Span::raw(format!("{} ", n.kind.icon())),
                        Span::styled(n.title.clone(), title_style),
                        Span::styled(
                            format!("  {}", dates::format_relative(n.timestamp, now)),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("    {}", n.message),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.notification_idx));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_task_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &TaskForm) {
        let area = centered_rect(70, 60, f.size());
        let categories: Vec<&Category> = self.state.assignable_categories().collect();
        let category = categories
            .get(form.category_idx)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "(none)".to_string());
        let mut lines = Vec::new();
        lines.push(field_line("Title", &form.title, form.field == FormField::Title));
        lines.push(field_line(
            "Description",
            &form.description,
            form.field == FormField::Description,
        ));
        lines.push(choice_line(
            "Category",
            &category,
            form.field == FormField::Category,
        ));
        lines.push(choice_line(
            "Priority",
            form.priority.label(),
            form.field == FormField::Priority,
        ));
        lines.push(field_line(
            "Due (YYYY-MM-DD)",
            &form.due,
            form.field == FormField::Due,
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter to save • Esc to cancel • Tab/Shift-Tab to move • ←/→ change choice",
            Style::default().fg(Color::Gray),
        )));
        self.draw_dialog(f, area, title, lines);
    }

    fn draw_profile_form(&self, f: &mut ratatui::Frame<'_>, form: &ProfileForm) {
        let area = centered_rect(60, 40, f.size());
        let lines = vec![
            field_line("Name", &form.name, form.field == ProfileField::Name),
            field_line("Email", &form.email, form.field == ProfileField::Email),
            field_line("Avatar URL", &form.avatar, form.field == ProfileField::Avatar),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save • Esc to cancel • Tab/Shift-Tab to move",
                Style::default().fg(Color::Gray),
            )),
        ];
        self.draw_dialog(f, area, "Edit Profile", lines);
    }

    fn draw_dialog(&self, f: &mut ratatui::Frame<'_>, area: Rect, title: &str, lines: Vec<Line<'static>>) {
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, task_id: &str) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .state
            .task(task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| task_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn category_color(color: CategoryColor) -> Color {
    match color {
        CategoryColor::Slate => Color::Gray,
        CategoryColor::Blue => Color::LightBlue,
        CategoryColor::Purple => Color::Magenta,
        CategoryColor::Pink => Color::LightMagenta,
        CategoryColor::Teal => Color::Cyan,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Rgb(255, 165, 0),
        Priority::Low => Color::Gray,
    }
}

fn task_item(task: &Task, categories: &[Category], today: NaiveDate) -> ListItem<'static> {
    let mut title_style = Style::default().fg(Color::White);
    if task.completed {
        title_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    let mut spans = vec![
        Span::styled(
            if task.completed { "[x] " } else { "[ ] " },
            Style::default().fg(if task.completed {
                Color::LightGreen
            } else {
                Color::Gray
            }),
        ),
        Span::styled(task.title.clone(), title_style),
        Span::raw("  "),
        Span::styled(
            task.priority.label(),
            Style::default().fg(priority_color(task.priority)),
        ),
    ];
    if let Some(category) = dates::category_for(task, categories) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("#{}", category.name),
            Style::default().fg(category_color(category.color)),
        ));
    }
    if let Some(due) = task.due_date {
        let overdue = dates::is_overdue(task, today);
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            if overdue {
                format!("{} overdue", dates::format_short_date(due))
            } else {
                dates::format_short_date(due)
            },
            Style::default().fg(if overdue { Color::LightRed } else { Color::Gray }),
        ));
    }
    let mut lines = vec![Line::from(spans)];
    if let Some(description) = &task.description {
        lines.push(Line::from(Span::styled(
            format!("    {}", description),
            Style::default().fg(Color::DarkGray),
        )));
    }
    ListItem::new(lines)
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(
            format!("{}: ", label),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD | Modifier::DIM),
        ),
        Span::styled(
            text,
            Style::default().fg(if active { Color::Cyan } else { Color::White }),
        ),
    ])
}

fn choice_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let shown = if active {
        format!("◀ {} ▶", value)
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(
            format!("{}: ", label),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD | Modifier::DIM),
        ),
        Span::styled(
            shown,
            Style::default().fg(if active { Color::Cyan } else { Color::White }),
        ),
    ])
}

fn pad_cell(text: &str) -> String {
    format!("{:<width$}", text, width = CELL_WIDTH)
}

fn prev_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
