//! Authoring client: course list, structure tree and entity editor on top of
//! [`ApiClient`].
//!
//! A [`Studio`] is driven through `&mut self`, so one editor never has two
//! saves in flight. Every failure is also pushed as a notice; loads leave the
//! previous state in place and optimistic changes are rolled back.

use std::time::Instant;

use crate::client::{ApiClient, ApiResult};
use crate::config;
use crate::model::entity::{CourseCreate, CourseUpdate, GENERAL_MODULE_ID, ItemCreate, ItemType, PostStatus};
use crate::web::dto::{
    account::MeResponse,
    common::{ReorderRequest, UploadResponse},
    courses::CourseSummary,
    tree::{ContentEntry, ContentTab},
};

pub mod draft;
pub mod editor;
pub mod filter;
pub mod notices;
pub mod optimistic;
pub mod reorder;
pub mod tree;

mod error;
pub use error::{StudioError, StudioResult};

use draft::{CourseDraft, Draft, EntityRef, ItemDraft, ModuleDraft};
use editor::{Editor, EditorError, SwitchChoice, Transition};
use filter::{CourseFilter, StatusCounts};
use notices::Notices;
use optimistic::Optimistic;
use tree::TreeCache;

/// Which media URL an upload fills on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    Video,
    Pdf,
}

pub struct Studio {
    api: ApiClient,
    me: MeResponse,
    courses: Vec<CourseSummary>,
    filter: CourseFilter,
    selected_course: Option<i64>,
    tree: TreeCache,
    editor: Editor,
    notices: Notices,
}

impl Studio {
    /// Checks the signed-in user may use the studio.
    pub async fn connect(api: ApiClient, settings: &config::Studio) -> StudioResult<Self> {
        let me = api.me().await?;
        if !me.can_use_studio {
            return Err(StudioError::AccessDenied);
        }
        tracing::debug!(user_id = me.id, "studio connected");

        Ok(Self {
            api,
            me,
            courses: Vec::new(),
            filter: CourseFilter::default(),
            selected_course: None,
            tree: TreeCache::default(),
            editor: Editor::from_settings(settings),
            notices: Notices::new(settings.notice_ttl()),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn me(&self) -> &MeResponse {
        &self.me
    }

    pub fn can_manage_upsell(&self) -> bool {
        self.me.can_manage_upsell
    }

    pub fn courses(&self) -> &[CourseSummary] {
        &self.courses
    }

    pub fn filter(&self) -> &CourseFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CourseFilter) {
        self.filter = filter;
    }

    pub fn visible_courses(&self) -> Vec<&CourseSummary> {
        self.filter.apply(&self.courses)
    }

    pub fn status_counts(&self) -> StatusCounts {
        CourseFilter::counts(&self.courses)
    }

    pub fn selected_course(&self) -> Option<i64> {
        self.selected_course
    }

    pub fn tree(&self) -> &TreeCache {
        &self.tree
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Pushes an error notice for a failed call.
    fn report<T, E: Into<StudioError>>(&mut self, result: Result<T, E>) -> StudioResult<T> {
        result.map_err(|e| {
            let e = e.into();
            self.notices.error(e.message());
            e
        })
    }

    pub async fn refresh_courses(&mut self) -> StudioResult<()> {
        let courses = self.api.list_courses().await;
        self.courses = self.report(courses)?;
        Ok(())
    }

    pub async fn refresh_tree(&mut self) -> StudioResult<()> {
        let course_id = self.selected_course.ok_or(StudioError::NoCourseSelected)?;
        let tree = self.api.load_tree(course_id).await;
        let tree = self.report(tree)?;
        self.tree.replace(course_id, tree);
        Ok(())
    }

    /// Selects `target`, loading it unless unsaved changes need a decision
    /// first. A `Transition::Confirm` is answered with
    /// [`Studio::resolve_switch`].
    pub async fn select(&mut self, target: EntityRef) -> StudioResult<Transition> {
        let transition = self.editor.request_select(target)?;
        if let Transition::Load(target) = transition {
            self.load(target).await?;
        }
        Ok(transition)
    }

    pub async fn select_course(&mut self, course_id: i64) -> StudioResult<Transition> {
        self.select(EntityRef::Course(course_id)).await
    }

    /// Answers the unsaved-changes prompt. If the save half fails the prompt
    /// stays pending and nothing is switched.
    pub async fn resolve_switch(&mut self, choice: SwitchChoice) -> StudioResult<EntityRef> {
        let target = self
            .editor
            .pending_switch()
            .ok_or(EditorError::NoPendingSwitch)?;

        match choice {
            SwitchChoice::Discard => {
                self.editor.discard_and_switch()?;
            }
            SwitchChoice::Save => {
                // an autosave may have landed while the prompt was open
                if self.editor.is_dirty() {
                    self.save().await?;
                }
                self.editor.begin_load(target);
            }
        }

        self.load(target).await?;
        Ok(target)
    }

    async fn enter_course(&mut self, course_id: i64) {
        if self.selected_course == Some(course_id) && self.tree.course_id() == Some(course_id) {
            return;
        }
        self.selected_course = Some(course_id);
        self.tree.clear();
        // a missing tree is already reported, the entity itself still loads
        let _ = self.refresh_tree().await;
    }

    async fn fetch_draft(&mut self, target: EntityRef) -> StudioResult<Draft> {
        match target {
            EntityRef::Course(id) => {
                let course = self.api.get_course(id).await?;
                self.enter_course(id).await;
                Ok(Draft::Course(CourseDraft::from(course)))
            }
            EntityRef::Module(id) => {
                let course_id = self.selected_course.ok_or(StudioError::NoCourseSelected)?;
                let node = self.tree.module(id).ok_or(StudioError::UnknownModule(id))?;
                Ok(Draft::Module(ModuleDraft::from_node(course_id, node)))
            }
            EntityRef::Item(id) => {
                let item = self.api.get_item(id).await?;
                self.enter_course(item.course_id()).await;
                Ok(Draft::Item(ItemDraft::from(item)))
            }
        }
    }

    /// Expects the editor to be `Loading` `target`.
    async fn load(&mut self, target: EntityRef) -> StudioResult<()> {
        match self.fetch_draft(target).await {
            Ok(draft) => {
                self.editor.finish_load(draft)?;
                Ok(())
            }
            Err(e) => {
                self.editor.fail_load();
                self.notices.error(e.message());
                Err(e)
            }
        }
    }

    pub fn edit_course<F: FnOnce(&mut CourseDraft)>(&mut self, f: F) -> StudioResult<()> {
        Ok(self.editor.edit_course(Instant::now(), f)?)
    }

    pub fn edit_module<F: FnOnce(&mut ModuleDraft)>(&mut self, f: F) -> StudioResult<()> {
        Ok(self.editor.edit_module(Instant::now(), f)?)
    }

    pub fn edit_item<F: FnOnce(&mut ItemDraft)>(&mut self, f: F) -> StudioResult<()> {
        Ok(self.editor.edit_item(Instant::now(), f)?)
    }

    /// Manual save. Validation problems become a warning notice and the
    /// endpoint is not called.
    pub async fn save(&mut self) -> StudioResult<()> {
        self.save_draft(false).await
    }

    /// Save triggered by a field losing focus. Behaves like the autosave:
    /// invalid drafts are skipped and nothing is reported.
    pub async fn blur(&mut self) -> StudioResult<()> {
        self.save_draft(true).await
    }

    /// Runs the autosave once its idle delay has passed and drops expired
    /// notices.
    pub async fn tick(&mut self, now: Instant) -> StudioResult<()> {
        self.notices.prune(now);
        if self.editor.autosave_due(now) {
            self.save_draft(true).await?;
        }
        Ok(())
    }

    async fn save_draft(&mut self, silent: bool) -> StudioResult<()> {
        let draft = match self.editor.begin_save() {
            Ok(draft) => draft,
            Err(_) if silent => return Ok(()),
            Err(EditorError::Invalid(reason)) => {
                self.notices.warning(reason.clone());
                return Err(EditorError::Invalid(reason).into());
            }
            Err(e) => return Err(e.into()),
        };

        let saved: ApiResult<&str> = match &draft {
            Draft::Course(d) => self
                .api
                .update_course(d.id, &d.to_update())
                .await
                .map(|_| "Course saved."),
            Draft::Module(d) => self
                .api
                .rename_module(d.id, &d.name)
                .await
                .map(|_| "Module saved."),
            Draft::Item(d) => self
                .api
                .update_item(d.id, &d.to_update(self.me.can_manage_upsell))
                .await
                .map(|_| "Content saved."),
        };

        match saved {
            Ok(message) => {
                self.editor.save_succeeded(Instant::now());
                if !silent {
                    self.notices.success(message);
                }
                tracing::debug!(entity = ?draft.entity(), silent, "draft saved");

                let _ = match draft {
                    Draft::Course(_) => self.refresh_courses().await,
                    Draft::Module(_) | Draft::Item(_) => self.refresh_tree().await,
                };
                Ok(())
            }
            Err(e) => {
                self.editor.save_failed();
                if !silent {
                    self.notices.error(e.message());
                }
                Err(e.into())
            }
        }
    }

    pub async fn create_course(&mut self, title: &str) -> StudioResult<i64> {
        let data = CourseCreate {
            title: title.to_string(),
            status: PostStatus::Draft,
            ..Default::default()
        };
        let created = self.api.create_course(&data).await;
        let id = self.report(created)?;

        self.notices.success("Course created.");
        let _ = self.refresh_courses().await;
        self.select(EntityRef::Course(id)).await?;
        Ok(id)
    }

    pub async fn create_module(&mut self, name: &str) -> StudioResult<i64> {
        let course_id = self.selected_course.ok_or(StudioError::NoCourseSelected)?;
        let created = self.api.create_module(course_id, name).await;
        let id = self.report(created)?;

        self.notices.success("Module created.");
        let _ = self.refresh_tree().await;
        self.select(EntityRef::Module(id)).await?;
        Ok(id)
    }

    pub async fn create_item(
        &mut self,
        module_id: i64,
        title: &str,
        item_type: ItemType,
    ) -> StudioResult<i64> {
        let course_id = self.selected_course.ok_or(StudioError::NoCourseSelected)?;
        let data = ItemCreate {
            course_id,
            module_id,
            title: title.to_string(),
            item_type,
            status: PostStatus::Draft,
            content: String::new(),
            excerpt: String::new(),
            menu_order: None,
        };
        let created = self.api.create_item(&data).await;
        let id = self.report(created)?;

        self.notices.success("Content created.");
        let _ = self.refresh_tree().await;
        self.select(EntityRef::Item(id)).await?;
        Ok(id)
    }

    pub async fn delete_course(&mut self, course_id: i64) -> StudioResult<()> {
        let deleted = self.api.delete_course(course_id).await;
        self.report(deleted)?;

        self.notices.success("Course deleted.");
        let _ = self.refresh_courses().await;
        if self.selected_course == Some(course_id) {
            self.selected_course = None;
            self.tree.clear();
            self.editor.clear();
        }
        Ok(())
    }

    pub async fn delete_module(&mut self, module_id: i64) -> StudioResult<()> {
        if module_id == GENERAL_MODULE_ID {
            return Err(EditorError::GeneralModule.into());
        }
        let deleted = self.api.delete_module(module_id).await;
        self.report(deleted)?;

        self.notices.success("Module deleted.");
        let _ = self.refresh_tree().await;
        if self.editor.selection() == Some(EntityRef::Module(module_id)) {
            self.editor.clear();
        }
        // the server moved the module's items to the general bucket
        self.editor.sync_draft(|draft| {
            if let Draft::Item(d) = draft
                && d.module_id == module_id
            {
                d.module_id = GENERAL_MODULE_ID;
            }
        });
        Ok(())
    }

    pub async fn delete_item(&mut self, item_id: i64) -> StudioResult<()> {
        let deleted = self.api.delete_item(item_id).await;
        self.report(deleted)?;

        self.notices.success("Content deleted.");
        let _ = self.refresh_tree().await;
        if self.editor.selection() == Some(EntityRef::Item(item_id)) {
            self.editor.clear();
        }
        Ok(())
    }

    /// Moves an item within its module. The tree shows the new order at once
    /// and goes back to the old one if the server refuses.
    pub async fn move_item(&mut self, module_id: i64, item_id: i64, to: usize) -> StudioResult<()> {
        let course_id = self.selected_course.ok_or(StudioError::NoCourseSelected)?;
        let (ordered_item_ids, pending) = self
            .tree
            .preview_move(module_id, item_id, to)
            .ok_or(StudioError::UnknownItem(item_id))?;

        let request = ReorderRequest {
            course_id,
            module_id,
            ordered_item_ids,
        };
        match self.api.reorder(&request).await {
            Ok(()) => {
                let _ = pending.commit();
                let _ = self.refresh_tree().await;
                Ok(())
            }
            Err(e) => {
                self.tree.rollback_move(module_id, pending);
                self.notices.error(e.message());
                Err(e.into())
            }
        }
    }

    pub async fn upload_media(&mut self, file_name: &str, mime: &str, bytes: Vec<u8>) -> StudioResult<UploadResponse> {
        self.editor.begin_upload();
        let uploaded = self.api.upload_media(file_name, mime, bytes).await;
        self.editor.finish_upload(Instant::now(), uploaded.is_ok());
        self.report(uploaded)
    }

    fn selected_course_draft(&self) -> StudioResult<i64> {
        match self.editor.draft() {
            Some(Draft::Course(d)) => Ok(d.id),
            Some(_) => Err(EditorError::WrongKind("course").into()),
            None => Err(EditorError::NothingSelected.into()),
        }
    }

    /// Uploads a cover and attaches it to the course being edited.
    pub async fn set_cover(&mut self, file_name: &str, mime: &str, bytes: Vec<u8>) -> StudioResult<UploadResponse> {
        let course_id = self.selected_course_draft()?;
        let uploaded = self.upload_media(file_name, mime, bytes).await?;

        let update = CourseUpdate {
            cover_id: Some(uploaded.id),
            ..Default::default()
        };
        let attached = self.api.update_course(course_id, &update).await;
        if attached.is_err() {
            self.editor.finish_upload(Instant::now(), false);
        }
        self.report(attached)?;

        self.editor.sync_draft(|draft| {
            if let Draft::Course(d) = draft {
                d.cover_id = uploaded.id;
                d.cover_url = uploaded.url.clone();
            }
        });
        let _ = self.refresh_courses().await;
        Ok(uploaded)
    }

    /// Clears the cover at once and restores it if the server refuses.
    pub async fn remove_cover(&mut self) -> StudioResult<()> {
        let course_id = self.selected_course_draft()?;

        let mut pending = None;
        self.editor.sync_draft(|draft| {
            if let Draft::Course(d) = draft {
                pending = Some(Optimistic::modify(d, |d| {
                    d.cover_id = 0;
                    d.cover_url.clear();
                }));
            }
        });

        let update = CourseUpdate {
            cover_id: Some(0),
            ..Default::default()
        };
        match self.api.update_course(course_id, &update).await {
            Ok(_) => {
                let _ = self.refresh_courses().await;
                Ok(())
            }
            Err(e) => {
                if let Some(pending) = pending {
                    self.editor.sync_draft(|draft| {
                        if let Draft::Course(d) = draft {
                            pending.rollback(d);
                        }
                    });
                }
                self.notices.error(e.message());
                Err(e.into())
            }
        }
    }

    /// Uploads a file and puts its URL into the item draft, which becomes
    /// dirty.
    pub async fn attach_item_media(
        &mut self,
        slot: MediaSlot,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> StudioResult<UploadResponse> {
        if !matches!(self.editor.draft(), Some(Draft::Item(_))) {
            return Err(EditorError::WrongKind("item").into());
        }
        let uploaded = self.upload_media(file_name, mime, bytes).await?;
        let url = uploaded.url.clone();
        self.edit_item(|d| match slot {
            MediaSlot::Video => d.media.video_url = url,
            MediaSlot::Pdf => d.media.pdf_url = url,
        })?;
        Ok(uploaded)
    }

    pub async fn content_tabs(&mut self) -> StudioResult<Vec<ContentTab>> {
        let tabs = self.api.content_tabs().await;
        self.report(tabs)
    }

    pub async fn content(&mut self, item_type: ItemType) -> StudioResult<Vec<ContentEntry>> {
        let entries = self.api.content(item_type).await;
        self.report(entries)
    }
}
