use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{backend::TestBackend, layout::Rect, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use table_crafter::{action::Action, components::Component, config::Config, tui::Event};

use super::{TEST_TERMINAL_HEIGHT, TEST_TERMINAL_WIDTH};

pub struct ComponentTestHarness<C: Component> {
    pub component: C,
    pub terminal: Terminal<TestBackend>,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl<C: Component> ComponentTestHarness<C> {
    pub fn new(mut component: C) -> Result<Self> {
        let backend = TestBackend::new(TEST_TERMINAL_WIDTH, TEST_TERMINAL_HEIGHT);
        let terminal = Terminal::new(backend)?;
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        component.register_action_handler(action_tx.clone())?;
        component.register_config_handler(Config::defaults()?)?;
        component.init(Rect::new(0, 0, TEST_TERMINAL_WIDTH, TEST_TERMINAL_HEIGHT))?;

        Ok(Self { component, terminal, action_tx, action_rx })
    }

    pub fn render(&mut self) -> Result<String> {
        self.terminal.draw(|f| {
            self.component.draw(f, f.area()).unwrap();
        })?;

        let buffer = self.terminal.backend().buffer();
        let mut output = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                output.push_str(buffer[(x, y)].symbol());
            }
            output.push('\n');
        }
        Ok(output.trim_end().to_string())
    }

    pub fn send_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        self.component.handle_key_events(key)
    }

    pub fn send_event(&mut self, event: Event) -> Result<Option<Action>> {
        self.component.handle_events(Some(event))
    }

    pub fn update(&mut self, action: Action) -> Result<Option<Action>> {
        self.component.update(action)
    }

    /// Applies `action` and then every action it returns, like the app loop does
    /// for a single component. Returned actions are collected in order.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Action>> {
        let mut returned = Vec::new();
        let mut next = Some(action);
        while let Some(action) = next.take() {
            next = self.component.update(action)?;
            if let Some(action) = &next {
                returned.push(action.clone());
            }
        }
        Ok(returned)
    }

    pub fn collect_actions(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Ok(action) = self.action_rx.try_recv() {
            actions.push(action);
        }
        actions
    }
}
