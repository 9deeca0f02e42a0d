// SPDX-License-Identifier: MIT

//! Screen-by-screen navigation over an ordered script
//!
//! The navigator keeps a stack of visited screen indices. Moving forward
//! scans past the current screen for the first one whose condition holds;
//! moving back pops the stack. A condition that fails to parse never blocks
//! the workflow: the screen or field is shown and the listener is told.

use std::collections::HashMap;

use super::types::{ConditionSite, Field, Screen, ScreenId};
use crate::error::{NavigationError, SyntaxError};
use crate::workflow::condition::ConditionCache;
use crate::workflow::state::Context;

/// Receives screen redefinitions and condition errors
pub trait NavigationListener {
    /// The current screen was replaced by `update_screen`
    fn on_screen_updated(&self, _screen: &Screen) {}

    /// A condition failed to parse and was treated as visible
    fn on_condition_error(&self, _site: &ConditionSite, _error: &SyntaxError) {}
}

/// Stack-based screen navigator.
///
/// Not thread-safe: `next`/`previous` read-modify-write the history, so
/// callers must serialize access.
pub struct Navigator {
    screens: Vec<Screen>,
    history: Vec<usize>,
    index_by_id: HashMap<ScreenId, usize>,
    cache: ConditionCache,
    listener: Option<Box<dyn NavigationListener>>,
}

impl Navigator {
    /// Create a navigator over `screens` in display order
    pub fn new(screens: Vec<Screen>) -> Result<Self, NavigationError> {
        let mut index_by_id = HashMap::new();
        for (index, screen) in screens.iter().enumerate() {
            if index_by_id.insert(screen.id.clone(), index).is_some() {
                return Err(NavigationError::DuplicateScreen(screen.id.clone()));
            }
        }

        Ok(Self {
            screens,
            history: Vec::new(),
            index_by_id,
            cache: ConditionCache::new(),
            listener: None,
        })
    }

    pub fn with_listener(mut self, listener: Box<dyn NavigationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Advance to the next applicable screen.
    ///
    /// The first screen is never condition-gated. `None` means there are no
    /// more screens and the summary should be shown; the history is left
    /// unchanged in that case.
    pub fn next(&mut self, ctx: &Context) -> Option<ScreenId> {
        let start = match self.history.last() {
            Some(top) => top + 1,
            None => {
                let first = self.screens.first()?;
                self.history.push(0);
                log::info!("Starting script at screen '{}'", first.id);
                return Some(first.id.clone());
            }
        };

        for index in start..self.screens.len() {
            let screen = &self.screens[index];
            let site = ConditionSite::Screen(screen.id.clone());
            if check_visible(
                &mut self.cache,
                self.listener.as_deref(),
                &site,
                screen.condition.as_deref(),
                ctx,
            ) {
                self.history.push(index);
                log::info!("Moved to screen '{}'", screen.id);
                return Some(screen.id.clone());
            }
            log::debug!("Skipping screen '{}': condition is false", screen.id);
        }

        log::info!("No screens left after index {}", start - 1);
        None
    }

    /// Step back to the previously shown screen.
    ///
    /// `None` means the start of the script was reached; the caller should
    /// stay where it is.
    pub fn previous(&mut self) -> Option<ScreenId> {
        self.history.pop();
        let id = self.current().map(str::to_string);
        match &id {
            Some(id) => log::info!("Moved back to screen '{}'", id),
            None => log::info!("Reached the beginning of the script"),
        }
        id
    }

    /// Id of the screen on top of the history, if `next` has been called
    pub fn current(&self) -> Option<&str> {
        self.current_screen().map(|s| s.id.as_str())
    }

    pub fn current_screen(&self) -> Option<&Screen> {
        self.history.last().map(|&index| &self.screens[index])
    }

    /// Visited screen ids, oldest first
    pub fn history(&self) -> Vec<&str> {
        self.history
            .iter()
            .map(|&index| self.screens[index].id.as_str())
            .collect()
    }

    pub fn screen(&self, id: &str) -> Option<&Screen> {
        self.index_by_id.get(id).map(|&index| &self.screens[index])
    }

    /// Forget the history so the next `next` starts from the first screen
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Replace the screen with the same id in place.
    ///
    /// The history is untouched. If the replaced screen is the current one
    /// the listener is notified.
    pub fn update_screen(&mut self, screen: Screen) -> Result<(), NavigationError> {
        let index = *self
            .index_by_id
            .get(&screen.id)
            .ok_or_else(|| NavigationError::UnknownScreen(screen.id.clone()))?;

        self.screens[index] = screen;
        log::debug!("Updated screen '{}'", self.screens[index].id);

        if self.history.last() == Some(&index) {
            if let Some(listener) = &self.listener {
                listener.on_screen_updated(&self.screens[index]);
            }
        }
        Ok(())
    }

    /// Fields of `screen_id` whose conditions hold, in authored order
    pub fn visible_fields(
        &mut self,
        screen_id: &str,
        ctx: &Context,
    ) -> Result<Vec<&Field>, NavigationError> {
        let index = *self
            .index_by_id
            .get(screen_id)
            .ok_or_else(|| NavigationError::UnknownScreen(screen_id.to_string()))?;

        let screen = &self.screens[index];
        let mut visible = Vec::new();
        for field in &screen.fields {
            let site = ConditionSite::Field {
                screen: screen.id.clone(),
                field: field.id.clone(),
            };
            if check_visible(
                &mut self.cache,
                self.listener.as_deref(),
                &site,
                field.condition.as_deref(),
                ctx,
            ) {
                visible.push(field);
            }
        }
        Ok(visible)
    }
}

/// Fail-open visibility check
fn check_visible(
    cache: &mut ConditionCache,
    listener: Option<&dyn NavigationListener>,
    site: &ConditionSite,
    condition: Option<&str>,
    ctx: &Context,
) -> bool {
    let Some(source) = condition else {
        return true;
    };

    match cache.check(source, ctx) {
        Ok(visible) => visible,
        Err(e) => {
            log::warn!("Condition on {} is invalid, showing it anyway: {}", site, e);
            if let Some(listener) = listener {
                listener.on_condition_error(site, &e);
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::state::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingListener {
        updated: Arc<Mutex<Vec<String>>>,
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl NavigationListener for RecordingListener {
        fn on_screen_updated(&self, screen: &Screen) {
            self.updated.lock().unwrap().push(screen.id.clone());
        }

        fn on_condition_error(&self, site: &ConditionSite, _error: &SyntaxError) {
            self.errors.lock().unwrap().push(site.to_string());
        }
    }

    fn script() -> Vec<Screen> {
        vec![
            Screen::new("a"),
            Screen::new("b").with_condition("$done = true"),
            Screen::new("c"),
        ]
    }

    #[test]
    fn test_skips_screen_with_false_condition() {
        let mut nav = Navigator::new(script()).unwrap();
        let ctx = Context::new();

        assert_eq!(nav.next(&ctx).as_deref(), Some("a"));
        assert_eq!(nav.next(&ctx).as_deref(), Some("c"));
        assert_eq!(nav.next(&ctx), None);
        assert_eq!(nav.current(), Some("c"));
    }

    #[test]
    fn test_shows_screen_with_true_condition() {
        let mut nav = Navigator::new(script()).unwrap();
        let ctx: Context = [("done", Value::Bool(true))].into_iter().collect();

        assert_eq!(nav.next(&ctx).as_deref(), Some("a"));
        assert_eq!(nav.next(&ctx).as_deref(), Some("b"));
        assert_eq!(nav.next(&ctx).as_deref(), Some("c"));
        assert_eq!(nav.history(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_first_screen_is_never_gated() {
        let screens = vec![
            Screen::new("gated").with_condition("$never = true"),
            Screen::new("next"),
        ];
        let mut nav = Navigator::new(screens).unwrap();
        assert_eq!(nav.next(&Context::new()).as_deref(), Some("gated"));
    }

    #[test]
    fn test_previous_pops_history() {
        let mut nav = Navigator::new(script()).unwrap();
        let ctx = Context::new();
        nav.next(&ctx);
        nav.next(&ctx);

        assert_eq!(nav.previous().as_deref(), Some("a"));
        assert_eq!(nav.current(), Some("a"));
        assert_eq!(nav.previous(), None);
        assert_eq!(nav.current(), None);
    }

    #[test]
    fn test_restart_reproduces_forward_scan() {
        let mut nav = Navigator::new(script()).unwrap();
        let ctx = Context::new();

        let first: Vec<_> = std::iter::from_fn(|| nav.next(&ctx)).collect();
        while nav.previous().is_some() {}
        let second: Vec<_> = std::iter::from_fn(|| nav.next(&ctx)).collect();

        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_next_rescans_after_answers_change() {
        let mut nav = Navigator::new(script()).unwrap();
        let mut ctx = Context::new();
        nav.next(&ctx);
        assert_eq!(nav.next(&ctx).as_deref(), Some("c"));

        nav.previous();
        ctx.set("done", true);
        assert_eq!(nav.next(&ctx).as_deref(), Some("b"));
    }

    #[test]
    fn test_current_before_next_is_none() {
        let nav = Navigator::new(script()).unwrap();
        assert_eq!(nav.current(), None);
        assert!(nav.current_screen().is_none());
    }

    #[test]
    fn test_empty_script() {
        let mut nav = Navigator::new(vec![]).unwrap();
        assert_eq!(nav.next(&Context::new()), None);
        assert_eq!(nav.previous(), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Navigator::new(vec![Screen::new("a"), Screen::new("a")]);
        assert_eq!(
            result.err(),
            Some(NavigationError::DuplicateScreen("a".to_string()))
        );
    }

    #[test]
    fn test_invalid_condition_fails_open() {
        let listener = RecordingListener::default();
        let screens = vec![
            Screen::new("a"),
            Screen::new("broken").with_condition("$done ="),
        ];
        let mut nav = Navigator::new(screens)
            .unwrap()
            .with_listener(Box::new(listener.clone()));
        let ctx = Context::new();

        nav.next(&ctx);
        assert_eq!(nav.next(&ctx).as_deref(), Some("broken"));
        assert_eq!(
            *listener.errors.lock().unwrap(),
            vec!["screen 'broken'".to_string()]
        );
    }

    #[test]
    fn test_update_current_screen_notifies_listener() {
        let listener = RecordingListener::default();
        let mut nav = Navigator::new(script())
            .unwrap()
            .with_listener(Box::new(listener.clone()));
        let ctx = Context::new();
        nav.next(&ctx);

        let mut renamed = Screen::new("a");
        renamed.title = "Welcome".to_string();
        nav.update_screen(renamed).unwrap();

        // not current: stored but no notification
        nav.update_screen(Screen::new("c").with_condition("$x = 1")).unwrap();

        assert_eq!(*listener.updated.lock().unwrap(), vec!["a".to_string()]);
        assert_eq!(nav.current_screen().unwrap().title, "Welcome");
        assert_eq!(nav.history(), vec!["a"]);
        assert_eq!(nav.next(&ctx), None);
    }

    #[test]
    fn test_update_unknown_screen() {
        let mut nav = Navigator::new(script()).unwrap();
        assert_eq!(
            nav.update_screen(Screen::new("zzz")),
            Err(NavigationError::UnknownScreen("zzz".to_string()))
        );
    }

    #[test]
    fn test_visible_fields() {
        let listener = RecordingListener::default();
        let screens = vec![Screen::new("vitals")
            .with_field(Field::new("temp"))
            .with_field(Field::new("rate").with_condition("$age < 5"))
            .with_field(Field::new("notes").with_condition("$age <"))];
        let mut nav = Navigator::new(screens)
            .unwrap()
            .with_listener(Box::new(listener.clone()));

        let ctx: Context = [("age", Value::Number(10.0))].into_iter().collect();
        let ids: Vec<_> = nav
            .visible_fields("vitals", &ctx)
            .unwrap()
            .iter()
            .map(|f| f.id.clone())
            .collect();

        assert_eq!(ids, vec!["temp", "notes"]);
        assert_eq!(
            *listener.errors.lock().unwrap(),
            vec!["field 'notes' on screen 'vitals'".to_string()]
        );
    }

    #[test]
    fn test_reset() {
        let mut nav = Navigator::new(script()).unwrap();
        let ctx = Context::new();
        nav.next(&ctx);
        nav.next(&ctx);
        nav.reset();
        assert_eq!(nav.current(), None);
        assert_eq!(nav.next(&ctx).as_deref(), Some("a"));
    }
}
