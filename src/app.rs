use std::{sync::Arc, time::Duration};

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::Rect;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::{
  action::Action,
  api::{HttpApi, TableApi},
  cli::Cli,
  components::{browser::Browser, Component},
  config::Config,
  mode::Mode,
  query::QueryRunner,
  session::{SessionError, TableEditSession},
  tui,
};

const HIGHLIGHT_DURATION: Duration = Duration::from_millis(1200);

pub struct App {
  pub config: Config,
  pub tick_rate: f64,
  pub frame_rate: f64,
  pub components: Vec<Box<dyn Component>>,
  pub should_quit: bool,
  pub should_suspend: bool,
  pub mode: Mode,
  pub last_tick_key_events: Vec<KeyEvent>,
  pub initial_table: Option<String>,
  api: Arc<dyn TableApi>,
  session: TableEditSession,
  query: QueryRunner,
}

impl App {
  pub fn new(cli_args: &Cli) -> Result<Self> {
    let config = Config::new()?.with_overrides(cli_args.base_url.as_deref(), cli_args.cookie.as_deref());
    log::info!("Using table API at {}", config.api.base_url);
    let api: Arc<dyn TableApi> = Arc::new(HttpApi::new(&config.api)?);
    Ok(Self::with_api(config, api, cli_args.tick_rate, cli_args.frame_rate, cli_args.table.clone()))
  }

  pub fn with_api(
    config: Config,
    api: Arc<dyn TableApi>,
    tick_rate: f64,
    frame_rate: f64,
    initial_table: Option<String>,
  ) -> Self {
    let browser = Browser::new_with_config(Some(config.clone()));
    Self {
      tick_rate,
      frame_rate,
      components: vec![Box::new(browser)],
      should_quit: false,
      should_suspend: false,
      config,
      mode: Mode::Tables,
      last_tick_key_events: Vec::new(),
      initial_table,
      session: TableEditSession::new(api.clone()),
      query: QueryRunner::new(api.clone()),
      api,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel();

    let mut tui = tui::Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate).paste(true);
    tui.enter()?;

    for component in self.components.iter_mut() {
      component.register_action_handler(action_tx.clone())?;
    }

    for component in self.components.iter_mut() {
      component.register_config_handler(self.config.clone())?;
    }

    for component in self.components.iter_mut() {
      component.init(Rect::default())?;
    }

    action_tx.send(Action::LoadTables)?;
    if let Some(table) = self.initial_table.take() {
      action_tx.send(Action::SelectTable(table))?;
      action_tx.send(Action::EnterMode(Mode::Grid))?;
    }

    loop {
      if let Some(e) = tui.next().await {
        match e {
          tui::Event::Quit => action_tx.send(Action::Quit)?,
          tui::Event::Tick => action_tx.send(Action::Tick)?,
          tui::Event::Render => action_tx.send(Action::Render)?,
          tui::Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
          tui::Event::Key(key) => {
            if let Some(keymap) = self.config.keybindings.get(&self.mode) {
              if let Some(action) = keymap.get(&vec![key]) {
                log::info!("Got action: {action:?}");
                action_tx.send(action.clone())?;
              } else if !self.mode.is_text_input() {
                // If the key was not handled as a single key action,
                // then consider it for multi-key combinations.
                self.last_tick_key_events.push(key);

                if let Some(action) = keymap.get(&self.last_tick_key_events) {
                  log::info!("Got action: {action:?}");
                  action_tx.send(action.clone())?;
                }
              }
            };
          },
          _ => {},
        }
        for component in self.components.iter_mut() {
          if let Some(action) = component.handle_events(Some(e.clone()))? {
            action_tx.send(action)?;
          }
        }
      }

      while let Ok(action) = action_rx.try_recv() {
        if action != Action::Tick && action != Action::Render {
          log::debug!("{action}");
        }
        match action {
          Action::Tick => {
            self.last_tick_key_events.drain(..);
          },
          Action::Quit => self.should_quit = true,
          Action::Suspend => self.should_suspend = true,
          Action::Resume => self.should_suspend = false,
          Action::Resize(w, h) => {
            tui.resize(Rect::new(0, 0, w, h))?;
            self.render(&mut tui, &action_tx)?;
          },
          Action::Render => self.render(&mut tui, &action_tx)?,
          Action::EnterMode(mode) => self.mode = mode,
          _ => self.dispatch_domain(&action, &action_tx).await?,
        }
        for component in self.components.iter_mut() {
          if let Some(action) = component.update(action.clone())? {
            action_tx.send(action)?
          };
        }
      }

      if self.should_suspend {
        tui.suspend()?;
        action_tx.send(Action::Resume)?;
        tui = tui::Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate).paste(true);
        tui.enter()?;
      } else if self.should_quit {
        tui.stop()?;
        break;
      }
    }
    tui.exit()?;
    Ok(())
  }

  fn render(&mut self, tui: &mut tui::Tui, action_tx: &UnboundedSender<Action>) -> Result<()> {
    tui.draw(|f| {
      for component in self.components.iter_mut() {
        if let Err(e) = component.draw(f, f.area()) {
          if let Err(send_error) = action_tx.send(Action::Error(format!("Failed to draw: {e:?}"))) {
            log::error!("{send_error}");
          }
        }
      }
    })?;
    Ok(())
  }

  /// Runs the session and query operations behind an action. Failures end up
  /// on the status line; only a closed action channel is an error here.
  pub async fn dispatch_domain(&mut self, action: &Action, tx: &UnboundedSender<Action>) -> Result<()> {
    match action {
      Action::LoadTables => match self.session.list_tables().await {
        Ok(tables) => {
          log::info!("Loaded {} tables", tables.len());
          tx.send(Action::TablesLoaded(tables))?;
        },
        Err(e) => tx.send(Action::Error(e.to_string()))?,
      },
      Action::SelectTable(table) => {
        let ticket = self.session.begin_load(table);
        self.publish_table(tx)?;
        let api = self.api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
          let fetched = TableEditSession::fetch(api, ticket).await;
          if let Err(e) = tx.send(Action::TableFetched(Box::new(fetched))) {
            log::error!("Failed to deliver table load: {e}");
          }
        });
      },
      Action::Reload | Action::Refresh => {
        if let Some(table) = self.session.current_table() {
          tx.send(Action::SelectTable(table.to_string()))?;
        }
      },
      Action::TableFetched(fetched) => {
        if let Some(Err(e)) = self.session.apply_load(*fetched.clone()) {
          tx.send(Action::Error(e.to_string()))?;
        }
        self.publish_table(tx)?;
      },
      Action::EditCell { row, column, value } => {
        let edited = self.session.locate(*row).and_then(|index| self.session.edit_cell(index, column, value.clone()));
        if let Err(e) = edited {
          tx.send(Action::Error(e.to_string()))?;
        }
        self.publish_table(tx)?;
      },
      Action::SubmitUpdates => {
        let outcome = self.session.submit_updates().await;
        self.report(outcome, tx)?;
        self.publish_table(tx)?;
      },
      Action::BeginInsert => match self.session.insert_form().await {
        Ok(form) => tx.send(Action::InsertFormReady(Box::new(form)))?,
        Err(e) => tx.send(Action::Error(e.to_string()))?,
      },
      Action::SubmitInsert(form) => {
        let outcome = self.session.submit_insert(*form.clone()).await;
        self.report(outcome, tx)?;
        self.publish_table(tx)?;
      },
      Action::DeleteRow(token) => {
        let outcome = match self.session.locate(*token) {
          Ok(index) => self.session.delete_row(index).await,
          Err(e) => Err(e),
        };
        self.report(outcome, tx)?;
        self.publish_table(tx)?;
      },
      Action::RunQuery { text, natural_language } => {
        let panel = self.query.run(text, *natural_language).await.clone();
        tx.send(Action::ShowQuery(Box::new(panel)))?;
      },
      Action::RunDirect(sql) => {
        let panel = self.query.run_direct(sql).await.clone();
        if panel.highlight {
          let ticket = self.query.highlight_ticket();
          let tx = tx.clone();
          tokio::spawn(async move {
            tokio::time::sleep(HIGHLIGHT_DURATION).await;
            tx.send(Action::ClearHighlight(ticket)).ok();
          });
        }
        tx.send(Action::ShowQuery(Box::new(panel)))?;
      },
      Action::ClearHighlight(ticket) => {
        if self.query.clear_highlight(*ticket) {
          tx.send(Action::ShowQuery(Box::new(self.query.panel().clone())))?;
        }
      },
      _ => {},
    }
    Ok(())
  }

  fn report(&self, outcome: Result<String, SessionError>, tx: &UnboundedSender<Action>) -> Result<()> {
    match outcome {
      Ok(message) => tx.send(Action::Status(message))?,
      Err(e) => tx.send(Action::Error(e.to_string()))?,
    }
    Ok(())
  }

  fn publish_table(&self, tx: &UnboundedSender<Action>) -> Result<()> {
    tx.send(Action::ShowTable(Box::new(self.session.view().clone())))?;
    Ok(())
  }
}
