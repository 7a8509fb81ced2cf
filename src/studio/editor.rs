//! Editor state machine.
//!
//! `Empty → Loading → Ready ⇄ Dirty → Saving → Ready | Dirty`. Time is passed
//! in explicitly so autosave and the "saved" flash can be driven by a caller
//! clock.

use std::time::{Duration, Instant};

use thiserror::Error;

use super::draft::{CourseDraft, Draft, EntityRef, ItemDraft, ModuleDraft};
use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Empty,
    Loading,
    Ready,
    Dirty,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    Idle,
    Editing,
    Saving,
    Saved,
    Uploading,
    Failed,
}

impl SaveIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Editing => "Editando",
            Self::Saving => "Salvando…",
            Self::Saved => "Salvo",
            Self::Uploading => "Enviando…",
            Self::Failed => "Erro ao salvar",
        }
    }
}

/// Answer to the unsaved-changes prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchChoice {
    Discard,
    Save,
}

/// What the caller must do after asking for a new selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Fetch the entity and hand it to [`Editor::finish_load`].
    Load(EntityRef),
    /// Unsaved changes: ask the user, then call back with a [`SwitchChoice`].
    Confirm(EntityRef),
    /// Already selected.
    Stay,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("nothing is selected")]
    NothingSelected,
    #[error("the editor is busy loading or saving")]
    Busy,
    #[error("the selection is not a {0}")]
    WrongKind(&'static str),
    #[error("the general module cannot be edited")]
    GeneralModule,
    #[error("there are no unsaved changes")]
    NotDirty,
    #[error("{0}")]
    Invalid(String),
    #[error("no switch is waiting for confirmation")]
    NoPendingSwitch,
    #[error("loaded entity does not match the selection")]
    StaleLoad,
}

pub type EditorResult<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Clone)]
pub struct Editor {
    state: EditorState,
    selection: Option<EntityRef>,
    draft: Option<Draft>,
    pending_switch: Option<EntityRef>,
    // restored if the next load fails
    previous: Option<Draft>,
    last_edited: Option<Instant>,
    autosave_at: Option<Instant>,
    autosave_delay: Duration,
    indicator: SaveIndicator,
    flash_until: Option<Instant>,
    flash_ttl: Duration,
}

impl Editor {
    pub fn new(autosave_delay: Duration, flash_ttl: Duration) -> Self {
        Self {
            state: EditorState::Empty,
            selection: None,
            draft: None,
            pending_switch: None,
            previous: None,
            last_edited: None,
            autosave_at: None,
            autosave_delay,
            indicator: SaveIndicator::Idle,
            flash_until: None,
            flash_ttl,
        }
    }

    pub fn from_settings(settings: &config::Studio) -> Self {
        Self::new(settings.autosave_delay(), settings.notice_ttl())
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn selection(&self) -> Option<EntityRef> {
        self.selection
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn pending_switch(&self) -> Option<EntityRef> {
        self.pending_switch
    }

    pub fn is_dirty(&self) -> bool {
        self.state == EditorState::Dirty
    }

    pub fn last_edited(&self) -> Option<Instant> {
        self.last_edited
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave_at
    }

    pub fn autosave_due(&self, now: Instant) -> bool {
        self.state == EditorState::Dirty && self.autosave_at.is_some_and(|at| now >= at)
    }

    pub fn indicator(&self, now: Instant) -> SaveIndicator {
        match (self.indicator, self.flash_until) {
            (SaveIndicator::Saved, Some(until)) if now >= until => SaveIndicator::Idle,
            (indicator, _) => indicator,
        }
    }

    /// Asks to select `target`. Never drops unsaved changes on its own.
    pub fn request_select(&mut self, target: EntityRef) -> EditorResult<Transition> {
        if target.is_general_module() {
            return Err(EditorError::GeneralModule);
        }
        match self.state {
            EditorState::Loading | EditorState::Saving => Err(EditorError::Busy),
            EditorState::Ready | EditorState::Dirty if self.selection == Some(target) => {
                Ok(Transition::Stay)
            }
            EditorState::Dirty => {
                self.pending_switch = Some(target);
                Ok(Transition::Confirm(target))
            }
            EditorState::Empty | EditorState::Ready => {
                self.begin_load(target);
                Ok(Transition::Load(target))
            }
        }
    }

    /// Drops the draft and starts loading the pending target.
    pub fn discard_and_switch(&mut self) -> EditorResult<EntityRef> {
        let target = self.pending_switch.ok_or(EditorError::NoPendingSwitch)?;
        self.draft = None;
        self.state = EditorState::Empty;
        self.begin_load(target);
        Ok(target)
    }

    /// Starts loading `target` unconditionally.
    pub fn begin_load(&mut self, target: EntityRef) {
        self.previous = match self.state {
            EditorState::Ready => self.draft.take(),
            _ => None,
        };
        self.state = EditorState::Loading;
        self.selection = Some(target);
        self.draft = None;
        self.pending_switch = None;
        self.last_edited = None;
        self.autosave_at = None;
        self.indicator = SaveIndicator::Idle;
        self.flash_until = None;
    }

    pub fn finish_load(&mut self, draft: Draft) -> EditorResult<()> {
        if self.state != EditorState::Loading || self.selection != Some(draft.entity()) {
            return Err(EditorError::StaleLoad);
        }
        self.draft = Some(draft);
        self.previous = None;
        self.state = EditorState::Ready;
        Ok(())
    }

    /// Puts back what was shown before the load started.
    pub fn fail_load(&mut self) {
        if self.state != EditorState::Loading {
            return;
        }
        match self.previous.take() {
            Some(draft) => {
                self.selection = Some(draft.entity());
                self.draft = Some(draft);
                self.state = EditorState::Ready;
            }
            None => self.clear(),
        }
    }

    fn edit_with<F>(&mut self, now: Instant, f: F) -> EditorResult<()>
    where
        F: FnOnce(&mut Draft) -> EditorResult<()>,
    {
        match self.state {
            EditorState::Empty => return Err(EditorError::NothingSelected),
            EditorState::Loading | EditorState::Saving => return Err(EditorError::Busy),
            EditorState::Ready | EditorState::Dirty => {}
        }
        let draft = self.draft.as_mut().ok_or(EditorError::NothingSelected)?;
        f(draft)?;

        self.state = EditorState::Dirty;
        self.last_edited = Some(now);
        self.autosave_at = Some(now + self.autosave_delay);
        self.indicator = SaveIndicator::Editing;
        self.flash_until = None;
        Ok(())
    }

    pub fn edit_course<F: FnOnce(&mut CourseDraft)>(&mut self, now: Instant, f: F) -> EditorResult<()> {
        self.edit_with(now, |draft| match draft {
            Draft::Course(d) => {
                f(d);
                Ok(())
            }
            _ => Err(EditorError::WrongKind("course")),
        })
    }

    pub fn edit_module<F: FnOnce(&mut ModuleDraft)>(&mut self, now: Instant, f: F) -> EditorResult<()> {
        self.edit_with(now, |draft| match draft {
            Draft::Module(d) => {
                f(d);
                Ok(())
            }
            _ => Err(EditorError::WrongKind("module")),
        })
    }

    pub fn edit_item<F: FnOnce(&mut ItemDraft)>(&mut self, now: Instant, f: F) -> EditorResult<()> {
        self.edit_with(now, |draft| match draft {
            Draft::Item(d) => {
                f(d);
                Ok(())
            }
            _ => Err(EditorError::WrongKind("item")),
        })
    }

    /// Changes the draft to mirror a change the server already has. Does not
    /// mark the editor dirty.
    pub fn sync_draft<F: FnOnce(&mut Draft)>(&mut self, f: F) {
        if let Some(draft) = self.draft.as_mut() {
            f(draft);
        }
    }

    /// `Dirty → Saving`. Returns the draft to send. A draft that fails
    /// validation stays `Dirty` with autosave disarmed until the next edit.
    pub fn begin_save(&mut self) -> EditorResult<Draft> {
        match self.state {
            EditorState::Empty => return Err(EditorError::NothingSelected),
            EditorState::Loading | EditorState::Saving => return Err(EditorError::Busy),
            EditorState::Ready => return Err(EditorError::NotDirty),
            EditorState::Dirty => {}
        }
        let draft = self.draft.clone().ok_or(EditorError::NothingSelected)?;
        if let Err(reason) = draft.validate() {
            self.autosave_at = None;
            return Err(EditorError::Invalid(reason));
        }

        self.state = EditorState::Saving;
        self.autosave_at = None;
        self.indicator = SaveIndicator::Saving;
        Ok(draft)
    }

    pub fn save_succeeded(&mut self, now: Instant) {
        if self.state != EditorState::Saving {
            return;
        }
        self.state = EditorState::Ready;
        self.indicator = SaveIndicator::Saved;
        self.flash_until = Some(now + self.flash_ttl);
    }

    pub fn save_failed(&mut self) {
        if self.state != EditorState::Saving {
            return;
        }
        self.state = EditorState::Dirty;
        self.indicator = SaveIndicator::Idle;
    }

    pub fn begin_upload(&mut self) {
        self.indicator = SaveIndicator::Uploading;
    }

    pub fn finish_upload(&mut self, now: Instant, ok: bool) {
        if ok {
            self.indicator = SaveIndicator::Saved;
            self.flash_until = Some(now + self.flash_ttl);
        } else {
            self.indicator = SaveIndicator::Failed;
        }
    }

    /// Back to `Empty`, dropping any draft.
    pub fn clear(&mut self) {
        self.state = EditorState::Empty;
        self.selection = None;
        self.draft = None;
        self.pending_switch = None;
        self.previous = None;
        self.last_edited = None;
        self.autosave_at = None;
        self.indicator = SaveIndicator::Idle;
        self.flash_until = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::ItemType;
    use crate::studio::draft::test::item_draft;

    const AUTOSAVE: Duration = Duration::from_secs(20);

    fn ready_with(draft: Draft) -> Editor {
        let mut editor = Editor::new(AUTOSAVE, Duration::from_secs(2));
        let target = draft.entity();
        assert_eq!(editor.request_select(target), Ok(Transition::Load(target)));
        editor.finish_load(draft).unwrap();
        editor
    }

    fn text_item() -> Draft {
        Draft::Item(item_draft(ItemType::Text))
    }

    fn module(id: i64) -> Draft {
        Draft::Module(ModuleDraft {
            id,
            course_id: 1,
            name: String::from("Intro"),
        })
    }

    #[test]
    fn edit_marks_dirty_and_arms_autosave() {
        let now = Instant::now();
        let mut editor = ready_with(text_item());
        assert_eq!(editor.state(), EditorState::Ready);

        editor.edit_item(now, |d| d.title = String::from("Nova")).unwrap();
        assert_eq!(editor.state(), EditorState::Dirty);
        assert_eq!(editor.last_edited(), Some(now));
        assert!(!editor.autosave_due(now + Duration::from_secs(19)));
        assert!(editor.autosave_due(now + AUTOSAVE));
    }

    #[test]
    fn every_edit_pushes_autosave_back() {
        let start = Instant::now();
        let mut editor = ready_with(text_item());
        editor.edit_item(start, |d| d.excerpt.push('a')).unwrap();
        let later = start + Duration::from_secs(15);
        editor.edit_item(later, |d| d.excerpt.push('b')).unwrap();

        assert!(!editor.autosave_due(start + AUTOSAVE));
        assert_eq!(editor.autosave_deadline(), Some(later + AUTOSAVE));
    }

    #[test]
    fn edit_of_wrong_kind_is_rejected() {
        let mut editor = ready_with(text_item());
        let err = editor.edit_course(Instant::now(), |_| {}).unwrap_err();
        assert_eq!(err, EditorError::WrongKind("course"));
        assert_eq!(editor.state(), EditorState::Ready);
    }

    #[test]
    fn switching_while_dirty_requires_a_choice() {
        let mut editor = ready_with(text_item());
        editor.edit_item(Instant::now(), |d| d.title.push('!')).unwrap();

        let target = EntityRef::Course(1);
        assert_eq!(editor.request_select(target), Ok(Transition::Confirm(target)));
        assert_eq!(editor.state(), EditorState::Dirty);
        assert_eq!(editor.pending_switch(), Some(target));

        assert_eq!(editor.discard_and_switch(), Ok(target));
        assert_eq!(editor.state(), EditorState::Loading);
        assert_eq!(editor.selection(), Some(target));
        assert!(editor.draft().is_none());
    }

    #[test]
    fn save_round_trip() {
        let now = Instant::now();
        let mut editor = ready_with(text_item());
        assert_eq!(editor.begin_save(), Err(EditorError::NotDirty));

        editor.edit_item(now, |d| d.title = String::from("Final")).unwrap();
        let sent = editor.begin_save().unwrap();
        assert_eq!(editor.state(), EditorState::Saving);
        assert_eq!(editor.indicator(now), SaveIndicator::Saving);
        assert!(matches!(sent, Draft::Item(ref d) if d.title == "Final"));
        assert_eq!(editor.request_select(EntityRef::Course(1)), Err(EditorError::Busy));

        editor.save_succeeded(now);
        assert_eq!(editor.state(), EditorState::Ready);
        assert_eq!(editor.indicator(now), SaveIndicator::Saved);
        assert_eq!(editor.indicator(now + Duration::from_secs(2)), SaveIndicator::Idle);
    }

    #[test]
    fn failed_save_stays_dirty_and_clears_indicator() {
        let now = Instant::now();
        let mut editor = ready_with(text_item());
        editor.edit_item(now, |d| d.title.push('x')).unwrap();
        editor.begin_save().unwrap();
        editor.save_failed();

        assert_eq!(editor.state(), EditorState::Dirty);
        assert_eq!(editor.indicator(now), SaveIndicator::Idle);
        assert!(!editor.autosave_due(now + AUTOSAVE));
    }

    #[test]
    fn invalid_draft_never_reaches_saving() {
        let now = Instant::now();
        let mut editor = ready_with(Draft::Item(item_draft(ItemType::Video)));
        editor.edit_item(now, |d| d.title = String::from("Sem vídeo")).unwrap();

        let err = editor.begin_save().unwrap_err();
        assert_eq!(err, EditorError::Invalid(String::from("Video URL is required.")));
        assert_eq!(editor.state(), EditorState::Dirty);
        assert!(!editor.autosave_due(now + AUTOSAVE));
    }

    #[test]
    fn general_module_cannot_be_selected() {
        let mut editor = Editor::new(AUTOSAVE, Duration::from_secs(2));
        assert_eq!(
            editor.request_select(EntityRef::Module(0)),
            Err(EditorError::GeneralModule)
        );
        assert_eq!(editor.state(), EditorState::Empty);
    }

    #[test]
    fn failed_load_restores_previous_draft() {
        let mut editor = ready_with(module(3));
        editor.request_select(EntityRef::Item(7)).unwrap();
        editor.fail_load();

        assert_eq!(editor.state(), EditorState::Ready);
        assert_eq!(editor.selection(), Some(EntityRef::Module(3)));
    }

    #[test]
    fn stale_load_is_refused() {
        let mut editor = Editor::new(AUTOSAVE, Duration::from_secs(2));
        editor.request_select(EntityRef::Item(7)).unwrap();
        assert_eq!(editor.finish_load(module(3)), Err(EditorError::StaleLoad));
        assert_eq!(editor.state(), EditorState::Loading);
    }
}
