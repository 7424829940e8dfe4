//! Editor session for one search bar: wires keystrokes, focus, the settle
//! debounce, panel selection and the favorite/history store together and
//! reports commits to the host over a channel.

pub mod debounce;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::catalog::{Catalog, FieldEntry, MenuItem, SearchType};
use crate::favorites::{FavoriteError, FavoriteItem, FavoriteStore};
use crate::query::rewrite::{normalize_whitespace, pending_value_hint};
use crate::query::{resolve, splice_padded, tokenize, FilterText, FocusContext, Panel, Splice};
use crate::service::SearchService;

use debounce::Debounce;

/// Delay between a structural keystroke and re-resolving the caret context.
pub const SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Where the caret is, as reported by the host's text field.
pub trait CaretSource {
    /// Caret position as a char offset.
    fn caret_offset(&self) -> usize;

    fn place_caret(&mut self, offset: usize);
}

/// A caret tracked by the session itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caret(pub usize);

impl CaretSource for Caret {
    fn caret_offset(&self) -> usize {
        self.0
    }

    fn place_caret(&mut self, offset: usize) {
        self.0 = offset;
    }
}

/// Notifications for the host, which decides what a commit triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Change(String),
    Clear,
    Favorite,
    Blur(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Backspace,
    Other,
}

/// Which popover is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "view", content = "panel")]
pub enum PanelView {
    Hidden,
    /// Fields, recent searches and favorites.
    Main,
    /// Condition, method or value suggestions.
    Menu(Panel),
}

pub struct FilterInput<S: SearchService + ?Sized, C: CaretSource = Caret> {
    value: String,
    catalog: Arc<Catalog>,
    caret: C,
    tokens: Vec<FilterText>,
    context: FocusContext,
    focused: bool,
    panel: PanelView,
    /// Set while the pointer interacts with a panel, so the input's blur
    /// does not commit.
    blur_in_panel: bool,
    manual_input: bool,
    placeholder: Option<String>,
    settle: Debounce,
    store: FavoriteStore<S>,
    events: UnboundedSender<InputEvent>,
}

impl<S: SearchService + ?Sized, C: CaretSource> FilterInput<S, C> {
    pub fn new(
        service: Arc<S>,
        catalog: Arc<Catalog>,
        search_type: SearchType,
        caret: C,
        events: UnboundedSender<InputEvent>,
    ) -> Self {
        Self {
            value: String::new(),
            catalog,
            caret,
            tokens: Vec::new(),
            context: FocusContext::none(),
            focused: false,
            panel: PanelView::Hidden,
            blur_in_panel: false,
            manual_input: false,
            placeholder: None,
            settle: Debounce::new(SETTLE_DELAY),
            store: FavoriteStore::new(service, search_type),
            events,
        }
    }

    /// Load history and favorites for the initial search type.
    pub async fn mount(&mut self) {
        self.store.refresh().await;
    }

    // --- Accessors ---

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn tokens(&self) -> &[FilterText] {
        &self.tokens
    }

    pub fn context(&self) -> &FocusContext {
        &self.context
    }

    pub fn panel(&self) -> PanelView {
        self.panel
    }

    pub fn caret(&self) -> usize {
        self.caret.caret_offset()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_manual_input(&self) -> bool {
        self.manual_input
    }

    /// Name of the field still waiting for a value, shown as a hint.
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn favorite_disabled(&self) -> bool {
        self.value.is_empty()
    }

    pub fn store(&self) -> &FavoriteStore<S> {
        &self.store
    }

    pub fn fields(&self) -> &[FieldEntry] {
        self.catalog.fields(self.store.search_type())
    }

    /// Entries of the visible condition/method/value menu.
    pub fn menu_items(&self) -> &[MenuItem] {
        match self.panel {
            PanelView::Menu(_) => self.catalog.menu_items(&self.context),
            _ => &[],
        }
    }

    // --- Host-driven updates ---

    /// Replace the value from outside (e.g. a URL query parameter).
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        if self.value.is_empty() {
            self.manual_input = false;
        }
        self.tokens = tokenize(&self.value);
    }

    pub async fn set_search_type(&mut self, search_type: SearchType) {
        self.store.set_search_type(search_type).await;
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.caret.place_caret(offset);
    }

    // --- Keyboard and focus ---

    pub fn on_input(&mut self, value: impl Into<String>) {
        self.placeholder = None;
        self.value = value.into();
        self.tokens = tokenize(&self.value);
    }

    pub async fn on_keydown(&mut self, key: Key) {
        match key {
            Key::Enter => {
                self.commit().await;
            }
            Key::Space | Key::Backspace => self.settle.schedule(),
            Key::Other => self.manual_input = true,
        }
    }

    pub fn on_focus(&mut self) {
        self.focused = true;
        if self.value.trim().is_empty() {
            self.panel = PanelView::Main;
            return;
        }
        self.settle.schedule();
    }

    /// Whether a context refresh is waiting on the settle delay.
    pub fn is_settling(&self) -> bool {
        self.settle.is_pending()
    }

    /// Wait out the settle delay, then refresh the caret context. Never
    /// resolves while nothing is scheduled.
    pub async fn settled(&mut self) {
        self.settle.fired().await;
        self.refresh_context();
    }

    /// Normalize whitespace, re-tokenize and pick the panel for the caret.
    pub fn refresh_context(&mut self) {
        let (value, caret) = normalize_whitespace(&self.value, self.caret.caret_offset());
        if value != self.value {
            self.value = value;
            self.caret.place_caret(caret);
        }
        self.tokens = tokenize(&self.value);

        let vocabulary = self.catalog.vocabulary(self.store.search_type());
        self.context = resolve(&self.tokens, &self.value, caret, &vocabulary);
        self.placeholder = None;

        match self.context.show {
            Panel::Field => self.panel = PanelView::Main,
            Panel::Value if self.catalog.menu_items(&self.context).is_empty() => {
                if self.context.field_id.as_deref().is_some_and(|id| !id.is_empty()) {
                    self.placeholder = pending_value_hint(&self.tokens).map(str::to_string);
                }
                self.hide_panel();
            }
            Panel::Condition | Panel::Method | Panel::Value => {
                self.panel = PanelView::Menu(self.context.show);
            }
            Panel::None => {
                self.context = FocusContext::none();
                self.hide_panel();
            }
        }
    }

    /// Commit the current value. Suppressed while a panel interaction is in
    /// progress; returns whether a change was emitted.
    pub async fn commit(&mut self) -> bool {
        if self.blur_in_panel {
            return false;
        }
        self.hide_panel();
        self.emit(InputEvent::Change(self.value.clone()));
        self.store.refresh_history().await;
        true
    }

    pub async fn on_blur(&mut self) {
        if self.blur_in_panel {
            return;
        }
        self.focused = false;
        self.emit(InputEvent::Blur(self.value.clone()));
        self.commit().await;
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.tokens.clear();
        self.placeholder = None;
        self.manual_input = false;
        self.context = FocusContext::none();
        self.settle.cancel();
        self.caret.place_caret(0);
        self.emit(InputEvent::Clear);
    }

    // --- Pointer ---

    pub fn panel_pointer_down(&mut self) {
        self.blur_in_panel = true;
    }

    pub fn panel_interaction_done(&mut self) {
        self.blur_in_panel = false;
    }

    /// A click outside the input and its panels closes them, unless a
    /// favorite is being edited.
    pub fn pointer_down_outside(&mut self) {
        if !self.store.is_editing() {
            self.hide_panel();
        }
    }

    // --- Suggestions ---

    /// Insert a field from the main panel. Unknown ids are ignored.
    pub fn select_field(&mut self, field_id: &str) -> Option<Splice> {
        let field = self.catalog.field(self.store.search_type(), field_id)?;
        let (text, separator) = field.insertion();

        let result = if self.value.is_empty() {
            let caret = text.chars().count();
            Splice { text, caret }
        } else {
            splice_padded(&self.value, &self.context, &text, separator)
        };
        Some(self.apply(result))
    }

    /// Insert a condition, method or value menu entry.
    pub fn select_menu_item(&mut self, item: &MenuItem) -> Splice {
        let chosen = if self.catalog.fill_id() {
            &item.id
        } else {
            &item.name
        };
        let result = splice_padded(&self.value, &self.context, chosen, " ");
        self.apply(result)
    }

    /// Insert the suggestion with `id` from whichever panel the context
    /// selects.
    pub fn select_suggestion(&mut self, id: &str) -> Option<Splice> {
        if self.context.show == Panel::Field {
            return self.select_field(id);
        }
        let item = self
            .catalog
            .menu_items(&self.context)
            .iter()
            .find(|i| i.id == id)?
            .clone();
        Some(self.select_menu_item(&item))
    }

    fn apply(&mut self, result: Splice) -> Splice {
        self.blur_in_panel = false;
        self.value = result.text.clone();
        self.tokens = tokenize(&self.value);
        self.caret.place_caret(result.caret);
        self.settle.schedule();
        result
    }

    pub async fn recall_history(&mut self, id: usize) -> bool {
        let Some(query) = self
            .store
            .history()
            .iter()
            .find(|h| h.id == id)
            .map(|h| h.name.clone())
        else {
            return false;
        };
        self.recall(query).await
    }

    pub async fn recall_favorite(&mut self, id: i64) -> bool {
        let Some(query) = self.store.favorite(id).map(|f| f.query_string.clone()) else {
            return false;
        };
        self.recall(query).await
    }

    async fn recall(&mut self, query: String) -> bool {
        self.set_value(query);
        self.blur_in_panel = false;
        self.commit().await
    }

    // --- Favorites ---

    /// Start saving the current value as a favorite. With an empty value the
    /// main panel opens instead.
    pub fn begin_favorite(&mut self) {
        self.panel = PanelView::Main;
        if self.favorite_disabled() {
            return;
        }
        self.store.begin_new();
        self.blur_in_panel = true;
        self.emit(InputEvent::Favorite);
    }

    pub fn set_favorite_name(&mut self, name: &str) {
        self.store.set_draft_name(name);
    }

    pub async fn save_favorite(&mut self, name: &str) -> Result<FavoriteItem, FavoriteError> {
        let item = self.store.create_favorite(name, &self.value).await?;
        self.blur_in_panel = false;
        Ok(item)
    }

    pub fn edit_favorite(&mut self, id: i64) -> Result<(), FavoriteError> {
        self.store.begin_rename(id)?;
        self.blur_in_panel = true;
        Ok(())
    }

    pub fn set_rename_buffer(&mut self, id: i64, name: &str) {
        self.store.set_rename_buffer(id, name);
    }

    pub async fn rename_favorite(
        &mut self,
        id: i64,
        name: &str,
    ) -> Result<FavoriteItem, FavoriteError> {
        let item = self.store.rename_favorite(id, name).await?;
        self.blur_in_panel = false;
        Ok(item)
    }

    pub async fn delete_favorite(&mut self, id: i64) -> Result<(), FavoriteError> {
        self.blur_in_panel = true;
        let result = self.store.delete_favorite(id).await;
        self.blur_in_panel = false;
        result
    }

    /// The favorite name field lost focus: drop the draft or rename.
    pub fn cancel_favorite_edit(&mut self, id: Option<i64>) {
        match id {
            Some(id) => self.store.cancel_edit(id),
            None => self.store.cancel_draft(),
        }
        self.blur_in_panel = false;
    }

    fn hide_panel(&mut self) {
        self.panel = PanelView::Hidden;
        self.blur_in_panel = false;
    }

    fn emit(&self, event: InputEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("input event receiver dropped");
        }
    }
}
