use crate::config::Config;
use crate::error::LauncherError;
use crate::executor::Executor;
use crate::model::MenuItem;
use crate::providers::Provider;
use crate::registry::{ProviderRegistry, Tab};
use crate::state::LauncherState;
use log::{debug, error, info};

/// Input already translated from raw key and pointer events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Committed text from the search field.
    Text(String),
    Backspace,
    Up,
    Down,
    Enter,
    Escape,
    NextTab,
    PrevTab,
    /// Pointer over the row showing this filtered index.
    Hover(usize),
    /// Click on the row showing this filtered index.
    Click(usize),
    ClickTab(usize),
}

/// Requests that may originate off the control thread; they are delivered
/// over a channel and applied by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCommand {
    Show,
    Hide,
    Toggle,
    /// Refresh live providers (all, or the named one) and reload items.
    Refresh(Option<String>),
}

/// What the caller has to do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Redraw,
    Shown,
    Hidden,
}

/// The launcher session: provider registry, filter state and the
/// Hidden/Visible state machine driven by input.
pub struct Launcher {
    state: LauncherState,
    registry: ProviderRegistry,
    executor: Box<dyn Executor>,
    hide_on_launch_failure: bool,
}

impl Launcher {
    pub fn new(config: &Config, executor: Box<dyn Executor>) -> Self {
        Self {
            state: LauncherState::new(&config.search, config.theme.max_visible_items),
            registry: ProviderRegistry::new(),
            executor,
            hide_on_launch_failure: config.general.hide_on_launch_failure,
        }
    }

    pub fn state(&self) -> &LauncherState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.registry.tabs()
    }

    pub fn active_tab(&self) -> usize {
        self.registry.active_index()
    }

    pub fn add_provider(&mut self, provider: Box<dyn Provider>) -> Result<(), LauncherError> {
        self.registry.add(provider)?;
        self.refresh_items();
        Ok(())
    }

    pub fn remove_provider(&mut self, name: &str) -> Result<Box<dyn Provider>, LauncherError> {
        let provider = self.registry.remove(name)?;
        self.refresh_items();
        Ok(provider)
    }

    pub fn clear_providers(&mut self) {
        self.registry.clear();
        self.refresh_items();
    }

    /// Re-aggregates items from the active provider set and re-applies the
    /// current query.
    pub fn refresh_items(&mut self) {
        let items = self.registry.aggregate();
        debug!("Aggregated {} items from {} providers", items.len(), self.registry.len());
        self.state.set_items(items);
    }

    pub fn show(&mut self) -> Outcome {
        if self.state.visible {
            return Outcome::Unchanged;
        }
        self.state.reset();
        self.refresh_items();
        self.state.visible = true;
        info!("Launcher shown with {} items", self.state.filtered_len());
        Outcome::Shown
    }

    pub fn hide(&mut self) -> Outcome {
        if !self.state.visible {
            return Outcome::Unchanged;
        }
        self.state.visible = false;
        Outcome::Hidden
    }

    pub fn toggle(&mut self) -> Outcome {
        if self.state.visible { self.hide() } else { self.show() }
    }

    pub fn handle_command(&mut self, command: LauncherCommand) -> Outcome {
        match command {
            LauncherCommand::Show => self.show(),
            LauncherCommand::Hide => self.hide(),
            LauncherCommand::Toggle => self.toggle(),
            LauncherCommand::Refresh(name) => {
                self.registry.refresh(name.as_deref());
                if !self.state.visible {
                    return Outcome::Unchanged;
                }
                self.refresh_items();
                Outcome::Redraw
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Outcome {
        if !self.state.visible {
            return Outcome::Unchanged;
        }

        match event {
            InputEvent::Text(text) => {
                let text: String = text.chars().filter(|c| !c.is_control()).collect();
                if text.is_empty() {
                    return Outcome::Unchanged;
                }
                self.state.query.push_str(&text);
                self.state.update_filtered_items();
                Outcome::Redraw
            }
            InputEvent::Backspace => {
                if self.state.query.pop().is_none() {
                    return Outcome::Unchanged;
                }
                self.state.update_filtered_items();
                Outcome::Redraw
            }
            InputEvent::Up => redraw_if(self.state.move_selection(-1)),
            InputEvent::Down => redraw_if(self.state.move_selection(1)),
            InputEvent::Hover(index) => redraw_if(self.state.select_visible(index)),
            InputEvent::Enter => self.execute_selected(),
            InputEvent::Click(index) => {
                self.state.select_visible(index);
                if self.state.selected_index() != Some(index) {
                    return Outcome::Unchanged;
                }
                self.execute_selected()
            }
            InputEvent::Escape => self.hide(),
            InputEvent::NextTab => self.switch_tab(|reg| reg.cycle(1)),
            InputEvent::PrevTab => self.switch_tab(|reg| reg.cycle(-1)),
            InputEvent::ClickTab(index) => self.switch_tab(|reg| reg.set_active(index)),
        }
    }

    fn switch_tab(&mut self, switch: impl FnOnce(&mut ProviderRegistry) -> bool) -> Outcome {
        if !switch(&mut self.registry) {
            return Outcome::Unchanged;
        }
        debug!("Switched to tab {:?}", self.registry.active_name());
        self.refresh_items();
        Outcome::Redraw
    }

    fn execute_selected(&mut self) -> Outcome {
        let Some(item) = self.state.selected_item() else {
            return Outcome::Unchanged;
        };

        match self.executor.execute(item) {
            Ok(()) => self.hide(),
            Err(e) => {
                error!("Failed to execute '{}': {:#}", item.display_name(), e);
                if self.hide_on_launch_failure {
                    self.hide()
                } else {
                    Outcome::Unchanged
                }
            }
        }
    }

    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.state.selected_item()
    }
}

fn redraw_if(changed: bool) -> Outcome {
    if changed { Outcome::Redraw } else { Outcome::Unchanged }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{LiveProvider, StaticProvider};
    use anyhow::{Result, anyhow};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        launched: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl Executor for Recorder {
        fn execute(&mut self, item: &MenuItem) -> Result<()> {
            self.launched.borrow_mut().push(item.display_name().to_string());
            if self.fail {
                return Err(anyhow!("spawn failed"));
            }
            Ok(())
        }
    }

    fn launcher_with(config: Config, recorder: &Recorder) -> Launcher {
        Launcher::new(&config, Box::new(recorder.clone()))
    }

    fn launcher(recorder: &Recorder) -> Launcher {
        launcher_with(Config::default(), recorder)
    }

    fn type_text(l: &mut Launcher, text: &str) {
        l.handle_input(InputEvent::Text(text.to_string()));
    }

    fn filtered(l: &Launcher) -> Vec<String> {
        l.state().filtered_items().map(|i| i.display_name().to_string()).collect()
    }

    #[test]
    fn type_and_launch_end_to_end() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("Terminal", 10), ("Files", 0)])).unwrap();

        assert_eq!(l.show(), Outcome::Shown);
        type_text(&mut l, "term");
        assert_eq!(filtered(&l), vec!["Terminal"]);
        assert_eq!(l.state().selected_index(), Some(0));

        assert_eq!(l.handle_input(InputEvent::Enter), Outcome::Hidden);
        assert_eq!(*rec.launched.borrow(), vec!["Terminal"]);
        assert!(!l.is_visible());
    }

    #[test]
    fn input_is_ignored_while_hidden() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0)])).unwrap();
        assert_eq!(l.handle_input(InputEvent::Text("a".into())), Outcome::Unchanged);
        assert_eq!(l.handle_input(InputEvent::Enter), Outcome::Unchanged);
        assert!(rec.launched.borrow().is_empty());
        assert!(l.state().query.is_empty());
    }

    #[test]
    fn show_resets_previous_session() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0), ("B", 0), ("C", 0)])).unwrap();
        l.show();
        type_text(&mut l, "x");
        l.handle_input(InputEvent::Backspace);
        l.handle_input(InputEvent::Down);
        type_text(&mut l, "b");
        assert_eq!(l.handle_input(InputEvent::Escape), Outcome::Hidden);

        l.show();
        assert!(l.state().query.is_empty());
        assert_eq!(l.state().selected_index(), Some(0));
        assert_eq!(l.state().scroll_offset(), 0);
        assert_eq!(l.state().filtered_len(), 3);
    }

    #[test]
    fn toggle_flips_visibility() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        assert_eq!(l.toggle(), Outcome::Shown);
        assert_eq!(l.show(), Outcome::Unchanged);
        assert_eq!(l.toggle(), Outcome::Hidden);
        assert_eq!(l.hide(), Outcome::Unchanged);
        assert_eq!(l.handle_command(LauncherCommand::Toggle), Outcome::Shown);
        assert_eq!(l.handle_command(LauncherCommand::Hide), Outcome::Hidden);
    }

    #[test]
    fn backspace_on_empty_query_is_a_no_op() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.show();
        assert_eq!(l.handle_input(InputEvent::Backspace), Outcome::Unchanged);
        type_text(&mut l, "ab");
        assert_eq!(l.handle_input(InputEvent::Backspace), Outcome::Redraw);
        assert_eq!(l.state().query, "a");
    }

    #[test]
    fn control_characters_are_not_typed() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.show();
        assert_eq!(l.handle_input(InputEvent::Text("\u{8}".into())), Outcome::Unchanged);
        assert!(l.state().query.is_empty());
    }

    #[test]
    fn arrows_only_move_selection() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0), ("B", 0)])).unwrap();
        l.show();
        assert_eq!(l.handle_input(InputEvent::Up), Outcome::Unchanged);
        assert_eq!(l.handle_input(InputEvent::Down), Outcome::Redraw);
        assert_eq!(l.handle_input(InputEvent::Down), Outcome::Unchanged);
        assert_eq!(l.selected_item().unwrap().display_name(), "B");
        assert_eq!(l.state().filtered_len(), 2);
    }

    #[test]
    fn enter_on_empty_results_is_safe() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0)])).unwrap();
        l.show();
        type_text(&mut l, "zzz");
        assert_eq!(l.state().selected_index(), None);
        assert_eq!(l.handle_input(InputEvent::Enter), Outcome::Unchanged);
        assert_eq!(l.handle_input(InputEvent::Click(0)), Outcome::Unchanged);
        assert!(l.is_visible());
        assert!(rec.launched.borrow().is_empty());
    }

    #[test]
    fn failed_launch_hides_by_default() {
        let rec = Recorder { fail: true, ..Default::default() };
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0)])).unwrap();
        l.show();
        assert_eq!(l.handle_input(InputEvent::Enter), Outcome::Hidden);
        assert_eq!(rec.launched.borrow().len(), 1);
    }

    #[test]
    fn failed_launch_can_keep_launcher_open() {
        let rec = Recorder { fail: true, ..Default::default() };
        let mut config = Config::default();
        config.general.hide_on_launch_failure = false;
        let mut l = launcher_with(config, &rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0)])).unwrap();
        l.show();
        assert_eq!(l.handle_input(InputEvent::Enter), Outcome::Unchanged);
        assert!(l.is_visible());
        assert_eq!(l.handle_input(InputEvent::Enter), Outcome::Unchanged);
        assert_eq!(rec.launched.borrow().len(), 2);
    }

    #[test]
    fn hover_and_click_select_rows() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0), ("B", 0), ("C", 0)])).unwrap();
        l.show();
        assert_eq!(l.handle_input(InputEvent::Hover(2)), Outcome::Redraw);
        assert_eq!(l.handle_input(InputEvent::Hover(2)), Outcome::Unchanged);
        assert_eq!(l.state().scroll_offset(), 0);
        assert_eq!(l.handle_input(InputEvent::Click(1)), Outcome::Hidden);
        assert_eq!(*rec.launched.borrow(), vec!["B"]);
    }

    #[test]
    fn tabs_isolate_providers_and_keep_query() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("p1", &[("Alpha", 0), ("Beta", 0), ("Gamma", 0)])).unwrap();
        l.add_provider(StaticProvider::boxed("p2", &[("Delta", 0), ("Epsilon", 0)])).unwrap();
        l.show();
        assert_eq!(l.tabs().len(), 2);
        assert_eq!(l.state().all_items().len(), 3);

        assert_eq!(l.handle_input(InputEvent::NextTab), Outcome::Redraw);
        assert_eq!(l.active_tab(), 1);
        assert_eq!(l.state().all_items().len(), 2);
        assert!(l.is_visible());

        type_text(&mut l, "ta");
        assert_eq!(filtered(&l), vec!["Delta"]);
        assert_eq!(l.handle_input(InputEvent::ClickTab(0)), Outcome::Redraw);
        assert_eq!(l.state().query, "ta");
        assert_eq!(filtered(&l), vec!["Beta"]);
        assert_eq!(l.handle_input(InputEvent::ClickTab(0)), Outcome::Unchanged);
        assert_eq!(l.handle_input(InputEvent::PrevTab), Outcome::Redraw);
        assert_eq!(l.active_tab(), 1);
    }

    #[test]
    fn removing_active_provider_rehomes_to_first_tab() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("p1", &[("A", 0)])).unwrap();
        l.add_provider(StaticProvider::boxed("p2", &[("B", 0)])).unwrap();
        l.add_provider(StaticProvider::boxed("p3", &[("C", 0)])).unwrap();
        l.show();
        l.handle_input(InputEvent::ClickTab(2));

        let removed = l.remove_provider("p3").unwrap();
        assert_eq!(removed.name(), "p3");
        assert_eq!(l.active_tab(), 0);
        assert_eq!(filtered(&l), vec!["A"]);

        l.remove_provider("p1").unwrap();
        assert!(l.tabs().is_empty());
        assert_eq!(filtered(&l), vec!["B"]);

        l.clear_providers();
        assert_eq!(l.state().filtered_len(), 0);
    }

    #[test]
    fn refresh_command_reloads_only_while_visible() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(StaticProvider::boxed("apps", &[("A", 0)])).unwrap();
        assert_eq!(l.handle_command(LauncherCommand::Refresh(None)), Outcome::Unchanged);
        l.show();
        assert_eq!(l.handle_command(LauncherCommand::Refresh(Some("apps".into()))), Outcome::Redraw);
    }

    #[test]
    fn refresh_command_brings_new_items_into_view() {
        let rec = Recorder::default();
        let mut l = launcher(&rec);
        l.add_provider(LiveProvider::boxed("web")).unwrap();
        l.show();
        type_text(&mut l, "web");
        assert!(filtered(&l).is_empty());

        assert_eq!(l.handle_command(LauncherCommand::Refresh(None)), Outcome::Redraw);
        assert_eq!(filtered(&l), vec!["web 1"]);
        assert_eq!(l.state().selected_index(), Some(0));

        l.handle_command(LauncherCommand::Refresh(Some("other".into())));
        assert_eq!(filtered(&l), vec!["web 1"]);

        // hidden refreshes still reach the provider and show up on the next show
        l.hide();
        assert_eq!(l.handle_command(LauncherCommand::Refresh(None)), Outcome::Unchanged);
        l.show();
        assert_eq!(filtered(&l), vec!["web 1", "web 2"]);
    }
}
