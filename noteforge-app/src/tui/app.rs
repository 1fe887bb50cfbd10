use crate::tui::{
    inputs::{map_event, Action},
    views::{self, RightPane},
};
use crossterm::{
    event::{self},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use noteforge_core::{
    progress_of, Flashcard, FlashcardId, FlashcardSet, Forge, ForgedSet, GenerationError,
    Navigator, ReforgeAction, SetId, SetProgress, Settings, Step,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::sync::Arc;
use tokio::{runtime::Runtime, task::JoinHandle};

type Generation = JoinHandle<Result<ForgedSet, GenerationError>>;

struct Pending {
    set_id: SetId,
    action: ReforgeAction,
    task: Generation,
}

pub struct TuiApp {
    forge: Arc<Forge>,
    settings: Settings,
    rt: Arc<Runtime>,
    sets: Vec<FlashcardSet>,
    sel: usize,
    cards: Vec<Flashcard>,
    nav: Navigator,
    current: Option<FlashcardId>,
    progress: SetProgress,
    reveal: bool,
    /// Set whose cards are open in the study pane.
    studying: Option<SetId>,
    /// In-flight generation; a second request is ignored while this is set.
    pending: Option<Pending>,
    status: String,
}

impl TuiApp {
    pub fn new(forge: Arc<Forge>, settings: Settings, rt: Arc<Runtime>) -> Self {
        Self {
            forge,
            settings,
            rt,
            sets: vec![],
            sel: 0,
            cards: vec![],
            nav: Navigator::new(vec![]),
            current: None,
            progress: SetProgress::default(),
            reveal: false,
            studying: None,
            pending: None,
            status: String::new(),
        }
    }

    pub fn generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn studying(&self) -> Option<SetId> {
        self.studying
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    fn selected_set(&self) -> Option<&FlashcardSet> {
        self.sets.get(self.sel)
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        let id = self.current?;
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn load_sets(&mut self) {
        let owner = self.settings.owner_id;
        self.sets = self
            .rt
            .block_on(self.forge.repo().list_sets(owner))
            .unwrap_or_default();
        self.sel = self.sel.min(self.sets.len().saturating_sub(1));
    }

    fn load_cards(&mut self, set_id: SetId) {
        self.cards = self
            .rt
            .block_on(self.forge.repo().list_flashcards(set_id))
            .unwrap_or_default();
        self.nav = Navigator::from_cards(&self.cards);
        self.progress = progress_of(&self.cards);
        if self.current.and_then(|id| self.nav.position(id)).is_none() {
            self.current = self.nav.first();
        }
    }

    fn start_study(&mut self) {
        let Some(set_id) = self.selected_set().map(|s| s.id) else {
            return;
        };
        self.current = None;
        self.load_cards(set_id);
        self.reveal = false;
        self.studying = Some(set_id);
    }

    fn step_next(&mut self) {
        let Some(id) = self.current else { return };
        match self.nav.next(id) {
            Some(Step::Card(next)) => {
                self.current = Some(next);
                self.reveal = false;
            }
            Some(Step::End) => {
                self.status = format!(
                    "End of set: {}/{} mastered ({}%)",
                    self.progress.mastered, self.progress.total, self.progress.percentage
                );
            }
            None => {}
        }
    }

    fn step_previous(&mut self) {
        if let Some(prev) = self.current.and_then(|id| self.nav.previous(id)) {
            self.current = Some(prev);
            self.reveal = false;
        }
    }

    fn mark_current_mastered(&mut self) {
        let Some(id) = self.current else { return };
        match self.rt.block_on(self.forge.mark_mastered(id)) {
            Ok((card, progress)) => {
                let set_id = card.set_id;
                if let Some(slot) = self.cards.iter_mut().find(|c| c.id == card.id) {
                    *slot = card;
                }
                self.progress = progress;
                if let Some(set) = self.sets.iter_mut().find(|s| s.id == set_id) {
                    set.mastered_cards = progress.mastered;
                    set.total_cards = progress.total;
                }
                self.step_next();
            }
            Err(e) => self.status = format!("Could not update card: {e}"),
        }
    }

    fn start_generation(&mut self) {
        if self.generating() {
            self.status = "Generation already in progress".to_string();
            return;
        }
        let Some((set_id, title)) = self.selected_set().map(|s| (s.id, s.title.clone())) else {
            return;
        };
        let mut rs = self.settings.reforge.clone();
        rs.use_selected_section = false;
        let action = rs.action;
        let forge = Arc::clone(&self.forge);
        let owner = self.settings.owner_id;

        self.status = match action {
            ReforgeAction::AddMore => format!("Generating {} more cards for \"{}\"...", rs.min_count, title),
            ReforgeAction::Regenerate => format!("Regenerating \"{}\" with {} cards...", title, rs.min_count),
        };
        let task = self
            .rt
            .spawn(async move { forge.reforge(owner, set_id, None, &rs).await });
        self.pending = Some(Pending { set_id, action, task });
    }

    /// Collects a finished background generation, if any.
    pub fn poll_generation(&mut self) {
        let finished = matches!(&self.pending, Some(p) if p.task.is_finished());
        if !finished {
            return;
        }
        let Some(Pending { set_id, action, task }) = self.pending.take() else { return };
        match self.rt.block_on(task) {
            Ok(Ok(forged)) => {
                self.status = format!(
                    "{}: {} new cards ({} total)",
                    action.as_str(),
                    forged.result.flashcards.len(),
                    forged.set.total_cards
                );
            }
            Ok(Err(e)) => self.status = e.user_message(),
            Err(e) => self.status = format!("Generation task failed: {e}"),
        }
        self.load_sets();
        if self.studying == Some(set_id) {
            self.load_cards(set_id);
        }
    }

    /// Applies one input. Returns false once the user asked to quit.
    pub fn handle(&mut self, action: Action) -> bool {
        let in_study = self.studying.is_some();
        match action {
            Action::Quit => return false,
            Action::Up if !in_study => self.sel = self.sel.saturating_sub(1),
            Action::Down if !in_study && self.sel + 1 < self.sets.len() => self.sel += 1,
            Action::Enter if !in_study => self.start_study(),
            Action::Back if in_study => {
                self.studying = None;
                self.load_sets();
            }
            Action::ToggleReveal if in_study => self.reveal = !self.reveal,
            Action::Next if in_study => self.step_next(),
            Action::Previous if in_study => self.step_previous(),
            Action::Mastered if in_study => self.mark_current_mastered(),
            Action::GenerateMore => self.start_generation(),
            _ => {}
        }
        true
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        self.load_sets();

        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.mainloop(&mut terminal);

        disable_raw_mode().ok();
        let mut out: Stdout = std::io::stdout();
        execute!(out, LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        res
    }

    fn mainloop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        loop {
            self.poll_generation();

            terminal.draw(|f| {
                let right = if self.studying.is_some() {
                    match self.current_card() {
                        Some(card) => RightPane::Card {
                            card,
                            reveal: self.reveal,
                            position: self.nav.position(card.id).unwrap_or(0),
                            total: self.nav.len(),
                            progress: self.progress,
                        },
                        None => RightPane::Empty("This set has no cards yet. Press g to generate some."),
                    }
                } else {
                    RightPane::Idle
                };
                views::draw_ui(f, f.size(), &self.sets, self.sel, right, &self.status);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? && !self.handle(map_event(event::read()?)) {
                break;
            }
        }
        Ok(())
    }
}
