use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use updown_core::{
    format_price, Actor, AppConfig, Catalog, CommandRejected, CounterpartyDue, Negotiation,
    NegotiationEvent, Product,
};

use crate::{
    browser,
    view::{Banner, NegotiationView},
};

const MAX_OFFER_LEN: usize = 15;
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    buyer: Color,
    seller: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            buyer: Color::Blue,
            seller: Color::Yellow,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Browse,
    Filter,
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone, Default)]
struct OfferPromptModal {
    input: String,
    cursor: usize,
}

impl OfferPromptModal {
    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn insert(&mut self, ch: char) {
        if !ch.is_ascii_digit() || self.input.len() >= MAX_OFFER_LEN {
            return;
        }
        self.input.insert(self.cursor, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn value(&self) -> Option<u64> {
        self.input.parse().ok().filter(|price| *price > 0)
    }
}

/// Terminal front end: listing browser plus the negotiation dialog.
pub struct UpdownApp {
    catalog: Catalog,
    config: AppConfig,
    state: UiState,
    negotiation: Option<Negotiation>,
    offer_prompt: Option<OfferPromptModal>,
    show_about: bool,
    responses_tx: mpsc::Sender<CounterpartyDue>,
    responses_rx: Option<mpsc::Receiver<CounterpartyDue>>,
    theme: Theme,
}

impl UpdownApp {
    pub fn new(catalog: Catalog, config: AppConfig) -> Self {
        let (responses_tx, responses_rx) = mpsc::channel(8);
        let mut state = UiState {
            categories: catalog.categories(),
            ..UiState::default()
        };
        state.apply_filter(&catalog);
        Self {
            catalog,
            config,
            state,
            negotiation: None,
            offer_prompt: None,
            show_about: false,
            responses_tx,
            responses_rx: Some(responses_rx),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state
            .set_status(format!("Loaded {} listings", self.catalog.len()));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx, self.config.tick_rate());

        let mut responses_rx = self
            .responses_rx
            .take()
            .context("event loop already running")?;

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event) {
                        break;
                    }
                }
                Some(due) = responses_rx.recv() => {
                    self.handle_counterparty_due(due);
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        if let Some(negotiation) = self.negotiation.take() {
            negotiation.close();
        }
        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        self.state.spinner = self.state.spinner.wrapping_add(1);
    }

    fn handle_counterparty_due(&mut self, due: CounterpartyDue) {
        let Some(negotiation) = self.negotiation.as_mut() else {
            debug!(?due, "Seller response arrived after the dialog closed");
            return;
        };
        let result = negotiation.resolve(due);
        self.report(result);
    }

    fn report(&mut self, result: Result<NegotiationEvent, CommandRejected>) {
        match result {
            Ok(event) => self.state.set_status(describe_event(&event)),
            Err(rejection) => debug!(%rejection, "Negotiation command ignored"),
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        if self.offer_prompt.is_some() {
            self.handle_offer_prompt_key(key)
        } else if self.show_about {
            self.show_about = false;
            Ok(())
        } else if self.negotiation.is_some() {
            self.handle_negotiation_key(key)
        } else {
            match self.state.mode {
                Mode::Filter => self.handle_filter_key(key),
                Mode::Browse => self.handle_browse_key(key),
            }
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.filter.clear();
                self.state.apply_filter(&self.catalog);
                self.state.set_status("Search cleared".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state.set_status(format!(
                    "{} listings match \"{}\"",
                    self.state.filtered.len(),
                    self.state.filter
                ));
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.state.apply_filter(&self.catalog);
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.push(c);
                    self.state.apply_filter(&self.catalog);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.state.move_to(0),
            KeyCode::Char('G') | KeyCode::End => self.state.move_to_end(),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.set_status("Type to search listings".to_string());
            }
            KeyCode::Tab => {
                self.state.cycle_category(1);
                self.state.apply_filter(&self.catalog);
                self.state
                    .set_status(format!("Category: {}", self.state.category_label()));
            }
            KeyCode::BackTab => {
                self.state.cycle_category(-1);
                self.state.apply_filter(&self.catalog);
                self.state
                    .set_status(format!("Category: {}", self.state.category_label()));
            }
            KeyCode::Char('o') => {
                if let Some(product) = self.state.current_product().cloned() {
                    self.open_photo(&product);
                }
            }
            KeyCode::Char('a') => self.show_about = true,
            KeyCode::Enter => self.open_negotiation(),
            _ => {}
        }
        Ok(())
    }

    fn handle_negotiation_key(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            self.close_negotiation();
            return Ok(());
        }
        if key.code == KeyCode::Char('o') {
            if let Some(product) = self.negotiation.as_ref().map(|n| n.product().clone()) {
                self.open_photo(&product);
            }
            return Ok(());
        }

        let Some(negotiation) = self.negotiation.as_mut() else {
            return Ok(());
        };
        let result = match key.code {
            KeyCode::Char('u') | KeyCode::Up => negotiation.raise(),
            KeyCode::Char('d') | KeyCode::Down => negotiation.lower(),
            KeyCode::Char('y') | KeyCode::Enter => negotiation.accept_counter(),
            KeyCode::Char('p') => {
                if negotiation.session().phase().accepts_proposals() {
                    self.offer_prompt = Some(OfferPromptModal::default());
                }
                return Ok(());
            }
            _ => return Ok(()),
        };
        self.report(result);
        Ok(())
    }

    fn handle_offer_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let mut submit: Option<Option<u64>> = None;
        if let Some(prompt) = self.offer_prompt.as_mut() {
            match key.code {
                KeyCode::Esc => {
                    self.offer_prompt = None;
                    return Ok(());
                }
                KeyCode::Enter => submit = Some(prompt.value()),
                KeyCode::Left => prompt.move_cursor(-1),
                KeyCode::Right => prompt.move_cursor(1),
                KeyCode::Home => prompt.cursor = 0,
                KeyCode::End => prompt.cursor = prompt.input.len(),
                KeyCode::Backspace => prompt.backspace(),
                KeyCode::Delete => prompt.delete(),
                KeyCode::Char(ch) => prompt.insert(ch),
                _ => {}
            }
        }

        match submit {
            Some(Some(price)) => {
                self.offer_prompt = None;
                if let Some(negotiation) = self.negotiation.as_mut() {
                    let result = negotiation.propose(price);
                    self.report(result);
                }
            }
            Some(None) => self.state.set_status("Enter a price above zero".to_string()),
            None => {}
        }
        Ok(())
    }

    fn open_negotiation(&mut self) {
        let Some(product) = self.state.current_product().cloned() else {
            self.state.set_status("No listing selected".to_string());
            return;
        };
        info!(product = %product.id, title = %product.title, "Opening negotiation");
        self.state.set_status(format!(
            "Negotiating {} from {}",
            product.title,
            format_price(product.initial_price)
        ));
        self.negotiation = Some(Negotiation::open(product, self.responses_tx.clone()));
    }

    fn close_negotiation(&mut self) {
        self.offer_prompt = None;
        if let Some(negotiation) = self.negotiation.take() {
            let session = negotiation.close();
            let message = match session.final_price() {
                Some(price) => format!("Deal closed at {}", format_price(price)),
                None => "Negotiation closed without a deal".to_string(),
            };
            self.state.set_status(message);
        }
    }

    fn open_photo(&mut self, product: &Product) {
        if product.image_url.is_empty() {
            self.state.set_status("Listing has no photo".to_string());
            return;
        }
        if browser::open_external_or_log(&product.image_url, self.config.browser_command.as_deref())
        {
            self.state.set_status("Opened photo in browser".to_string());
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.draw_browse(frame);
        if let Some(negotiation) = &self.negotiation {
            self.render_negotiation(frame, negotiation);
        }
        if let Some(prompt) = &self.offer_prompt {
            self.render_offer_prompt(frame, prompt);
        }
        if self.show_about {
            self.render_about(frame);
        }
    }

    fn draw_browse(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        self.render_header(frame, chunks[0]);
        self.render_product_list(frame, body_chunks[0]);
        self.render_product_details(frame, body_chunks[1]);
        self.render_status(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                "UpDown ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("buyer-first second-hand market  ", Style::default().fg(self.theme.muted)),
        ];
        let labels =
            std::iter::once("All").chain(self.state.categories.iter().map(String::as_str));
        for (idx, label) in labels.enumerate() {
            let style = if idx == self.state.category_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            spans.push(Span::styled(format!(" {label} "), style));
            spans.push(Span::raw(" "));
        }
        let paragraph =
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_product_list(&mut self, frame: &mut Frame, area: Rect) {
        // two lines per listing
        self.state.list_height = (area.height.saturating_sub(2) / 2).max(1) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let now = Utc::now();
        let mut list_state = ListState::default();
        let products = self.state.visible_products();
        if !products.is_empty() {
            let selected = self
                .state
                .cursor
                .saturating_sub(self.state.offset)
                .min(products.len().saturating_sub(1));
            list_state.select(Some(selected));
        }

        let items: Vec<ListItem> = products
            .iter()
            .enumerate()
            .map(|(idx, product)| {
                let is_selected = self.state.cursor == self.state.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut title = vec![
                    marker,
                    Span::styled(
                        product.title.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ];
                if product.is_auction_active {
                    title.push(Span::styled(
                        " LIVE",
                        Style::default()
                            .fg(self.theme.danger)
                            .add_modifier(Modifier::BOLD),
                    ));
                }

                let mut details = vec![
                    Span::raw("  "),
                    Span::styled(
                        format_price(product.listed_price()),
                        Style::default().fg(self.theme.accent),
                    ),
                ];
                if product.current_bid.is_some() {
                    details.push(Span::raw(" "));
                    details.push(Span::styled(
                        format_price(product.initial_price),
                        Style::default()
                            .fg(self.theme.muted)
                            .add_modifier(Modifier::CROSSED_OUT),
                    ));
                }
                details.push(Span::styled(
                    format!("  {} · {}", product.location, product.listed_ago(now)),
                    Style::default().fg(self.theme.muted),
                ));

                ListItem::new(vec![Line::from(title), Line::from(details)])
            })
            .collect();

        let title = format!(
            "Listings ({}/{})",
            self.state.filtered.len(),
            self.catalog.len()
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_product_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Listing");
        let Some(product) = self.state.current_product() else {
            let paragraph = Paragraph::new(vec![
                Line::from("No listings found."),
                Line::from(Span::styled(
                    "Try another search or category.",
                    Style::default().fg(self.theme.muted),
                )),
            ])
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                product.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                product.category.clone(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(""),
        ];
        if !product.description.is_empty() {
            lines.push(Line::from(product.description.clone()));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(vec![
            Span::raw("Asking: "),
            Span::styled(
                format_price(product.initial_price),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        if let Some(bid) = product.current_bid {
            lines.push(Line::from(format!("Current bid: {}", format_price(bid))));
        }
        let auction = if product.is_auction_active {
            Span::styled("Auction live", Style::default().fg(self.theme.danger))
        } else {
            Span::styled("Not in auction", Style::default().fg(self.theme.muted))
        };
        lines.push(Line::from(auction));
        if let Some(end) = product.auction_end_time {
            lines.push(Line::from(format!(
                "Ends: {}",
                end.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw(format!("Seller: {} ", product.seller.name)),
            Span::styled(
                format!("★ {:.1}", product.seller.rating),
                Style::default().fg(self.theme.warning),
            ),
        ]));
        lines.push(Line::from(format!("Location: {}", product.location)));
        lines.push(Line::from(format!(
            "Listed: {}",
            product.listed_ago(Utc::now())
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" negotiate  "),
            Span::styled("o", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" open photo"),
        ]));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_negotiation(&self, frame: &mut Frame, negotiation: &Negotiation) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(68_u16, frame_area.width.saturating_sub(4)), 30);
        let height = cmp::max(cmp::min(26_u16, frame_area.height.saturating_sub(2)), 12);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let product = negotiation.product();
        let view = NegotiationView::from_session(negotiation.session());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Negotiate · {}", product.title));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(3),
            ])
            .split(inner);

        let summary = Paragraph::new(vec![
            Line::from(vec![
                Span::raw(format!("{} ", product.seller.name)),
                Span::styled(
                    format!("★ {:.1}", product.seller.rating),
                    Style::default().fg(self.theme.warning),
                ),
            ]),
            Line::from(Span::styled(
                format!("Asking {} · floor {}", view.asking_price, view.floor_price),
                Style::default().fg(self.theme.muted),
            )),
        ]);
        frame.render_widget(summary, chunks[0]);

        let price_label = if view.is_closed() {
            "Final price"
        } else {
            "On the table"
        };
        let price = Paragraph::new(vec![
            Line::from(Span::styled(price_label, Style::default().fg(self.theme.muted))),
            Line::from(Span::styled(
                view.current_price.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(price, chunks[1]);

        frame.render_widget(self.banner_paragraph(view.banner.as_ref()), chunks[2]);
        frame.render_widget(self.controls_paragraph(&view), chunks[3]);

        let history: Vec<ListItem> = view
            .history
            .iter()
            .map(|line| {
                let color = match line.actor {
                    Actor::Buyer => self.theme.buyer,
                    Actor::Seller => self.theme.seller,
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<7}", line.label),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("{:>14}  ", line.price)),
                    Span::styled(line.time.clone(), Style::default().fg(self.theme.muted)),
                ]))
            })
            .collect();
        // keep the newest entries in view
        let visible = chunks[4].height.saturating_sub(2) as usize;
        let skip = history.len().saturating_sub(visible);
        let list = List::new(history.into_iter().skip(skip).collect::<Vec<_>>())
            .block(Block::default().borders(Borders::TOP).title("History"));
        frame.render_widget(list, chunks[4]);
    }

    fn banner_paragraph(&self, banner: Option<&Banner>) -> Paragraph<'static> {
        let lines = match banner {
            None => vec![Line::from(Span::styled(
                "Use UP/DOWN to make an offer.",
                Style::default().fg(self.theme.muted),
            ))],
            Some(Banner::Waiting) => {
                let frame = SPINNER[self.state.spinner % SPINNER.len()];
                vec![Line::from(Span::styled(
                    format!("{frame} Waiting for the seller…"),
                    Style::default().fg(self.theme.warning),
                ))]
            }
            Some(Banner::CounterOffer { price }) => vec![
                Line::from(Span::styled(
                    "Seller counter-offer",
                    Style::default().fg(self.theme.seller),
                )),
                Line::from(Span::styled(
                    format_price(*price),
                    Style::default()
                        .fg(self.theme.seller)
                        .add_modifier(Modifier::BOLD),
                )),
            ],
            Some(Banner::Success { final_price }) => vec![
                Line::from(Span::styled(
                    "✔ Deal!",
                    Style::default()
                        .fg(self.theme.success)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("Final price {}", format_price(*final_price)),
                    Style::default().fg(self.theme.success),
                )),
                Line::from(Span::styled(
                    "Contact the seller to arrange the hand-over.",
                    Style::default().fg(self.theme.muted),
                )),
            ],
            Some(Banner::Stalled { price }) => vec![
                Line::from(Span::styled(
                    format!("{} is too low for the seller.", format_price(*price)),
                    Style::default().fg(self.theme.danger),
                )),
                Line::from("No deal yet, try again."),
            ],
        };
        Paragraph::new(lines).alignment(Alignment::Center)
    }

    fn controls_paragraph(&self, view: &NegotiationView) -> Paragraph<'static> {
        let key_style = |enabled: bool| {
            if enabled {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            }
        };
        let mut spans = vec![
            Span::styled("u", key_style(view.buttons_enabled)),
            Span::styled(" UP +5%  ", key_style(view.buttons_enabled)),
            Span::styled("d", key_style(view.buttons_enabled)),
            Span::styled(" DOWN -5%  ", key_style(view.buttons_enabled)),
            Span::styled("p", key_style(view.buttons_enabled)),
            Span::styled(" offer  ", key_style(view.buttons_enabled)),
        ];
        if view.can_accept {
            spans.push(Span::styled(
                "y",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(" accept  ", Style::default().fg(self.theme.success)));
        }
        spans.push(Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" close"));
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn render_offer_prompt(&self, frame: &mut Frame, prompt: &OfferPromptModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(40_u16, frame_area.width.saturating_sub(4)), 24);
        let height = 6_u16.min(frame_area.height.saturating_sub(2)).max(5);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let preview = prompt
            .value()
            .map(format_price)
            .unwrap_or_else(|| "-".to_string());
        let paragraph = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(prompt.input.clone()),
            ]),
            Line::from(Span::styled(preview, Style::default().fg(self.theme.muted))),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" offer  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).title("Your price"));
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 1);
    }

    fn render_about(&self, frame: &mut Frame) {
        let area = centered_rect(46, 8, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "UpDown 마켓플레이스",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from("Buyer-first second-hand marketplace"),
            Line::from(format!("Version {}", env!("CARGO_PKG_VERSION"))),
            Line::from(""),
            Line::from(Span::styled(
                "Press any key to close",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("About UpDown"));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Filter {
            format!("Search: {}", self.state.filter)
        } else {
            self.state.status.clone()
        };
        let secondary = Line::from(Span::styled(
            "j/k move  Enter negotiate  / search  Tab category  o photo  a about  q quit",
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![Line::from(primary), secondary])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn describe_event(event: &NegotiationEvent) -> String {
    match event {
        NegotiationEvent::Proposed { price, .. } => {
            format!("Offered {}; waiting for the seller", format_price(*price))
        }
        NegotiationEvent::CounterOffered { price } => {
            format!("Seller countered at {}", format_price(*price))
        }
        NegotiationEvent::DealStruck { final_price } => {
            format!("Deal! Final price {}", format_price(*final_price))
        }
        NegotiationEvent::Stalled { price } => {
            format!("Seller declined {}. No deal yet, try again", format_price(*price))
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>, tick_rate: Duration) {
    thread::spawn(move || loop {
        match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[derive(Default)]
struct UiState {
    filtered: Vec<Product>,
    categories: Vec<String>,
    /// 0 is "All"; `n` selects `categories[n - 1]`.
    category_index: usize,
    cursor: usize,
    offset: usize,
    list_height: usize,
    filter: String,
    status: String,
    mode: Mode,
    should_quit: bool,
    spinner: usize,
}

impl UiState {
    fn selected_category(&self) -> Option<&str> {
        self.category_index
            .checked_sub(1)
            .and_then(|idx| self.categories.get(idx))
            .map(String::as_str)
    }

    fn category_label(&self) -> &str {
        self.selected_category().unwrap_or("All")
    }

    fn cycle_category(&mut self, delta: isize) {
        let options = self.categories.len() as isize + 1;
        self.category_index = (self.category_index as isize + delta).rem_euclid(options) as usize;
    }

    fn apply_filter(&mut self, catalog: &Catalog) {
        self.filtered = catalog.filter(&self.filter, self.selected_category());
        self.cursor = 0;
        self.offset = 0;
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = index.min(self.filtered.len() - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        self.move_to(self.filtered.len().saturating_sub(1));
    }

    fn visible_products(&self) -> &[Product] {
        if self.filtered.is_empty() {
            return &[];
        }
        let end = (self.offset + self.list_height.max(1)).min(self.filtered.len());
        &self.filtered[self.offset..end]
    }

    fn current_product(&self) -> Option<&Product> {
        self.filtered.get(self.cursor)
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn clamp_cursor(&mut self) {
        if self.filtered.is_empty() {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.filtered.len() {
            self.cursor = self.filtered.len() - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.filtered.len().saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> (Catalog, UiState) {
        let catalog = Catalog::sample();
        let mut state = UiState {
            categories: catalog.categories(),
            list_height: 3,
            ..UiState::default()
        };
        state.apply_filter(&catalog);
        (catalog, state)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn category_cycle_wraps_through_all() {
        let (catalog, mut state) = sample_state();
        assert_eq!(state.category_label(), "All");
        state.cycle_category(1);
        state.apply_filter(&catalog);
        assert_eq!(state.category_label(), "전자기기");
        assert_eq!(state.filtered.len(), 3);
        state.cycle_category(-2);
        assert_eq!(state.category_label(), "가전제품");
        state.cycle_category(1);
        assert_eq!(state.category_label(), "All");
    }

    #[test]
    fn cursor_scrolls_within_list_height() {
        let (_, mut state) = sample_state();
        state.move_cursor(4);
        assert_eq!(state.cursor, 4);
        assert_eq!(state.offset, 2);
        state.move_cursor(10);
        assert_eq!(state.cursor, 5);
        assert_eq!(state.visible_products().len(), 3);
        state.move_to(0);
        assert_eq!(state.offset, 0);
    }

    #[test]
    fn offer_prompt_accepts_digits_only() {
        let mut prompt = OfferPromptModal::default();
        for ch in "12a3,000".chars() {
            prompt.insert(ch);
        }
        assert_eq!(prompt.input, "123000");
        prompt.move_cursor(-3);
        prompt.backspace();
        assert_eq!(prompt.input, "12000");
        assert_eq!(prompt.value(), Some(12_000));

        let empty = OfferPromptModal::default();
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn ticks_while_searching_keep_the_status_message() -> Result<()> {
        let mut app = UpdownApp::new(Catalog::sample(), AppConfig::default());
        app.handle_input(Event::Key(key(KeyCode::Char('/'))))?;
        assert_eq!(app.state.mode, Mode::Filter);
        app.handle_input(Event::Key(key(KeyCode::Char('x'))))?;

        app.process_app_event(Some(AppEvent::Tick));
        app.process_app_event(Some(AppEvent::Tick));
        assert_eq!(app.state.status, "Type to search listings");
        assert_eq!(app.state.spinner, 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn dialog_keys_drive_the_negotiation() -> Result<()> {
        let mut app = UpdownApp::new(Catalog::sample(), AppConfig::default());
        let mut responses = app.responses_rx.take().expect("receiver");

        app.handle_input(Event::Key(key(KeyCode::Enter)))?;
        assert!(app.negotiation.is_some());

        app.handle_input(Event::Key(key(KeyCode::Char('p'))))?;
        for ch in "900000".chars() {
            app.handle_input(Event::Key(key(KeyCode::Char(ch))))?;
        }
        app.handle_input(Event::Key(key(KeyCode::Enter)))?;
        assert!(app.offer_prompt.is_none());
        assert!(app
            .negotiation
            .as_ref()
            .is_some_and(|n| n.session().is_negotiating()));

        // locked while waiting: ignored without surfacing an error
        app.handle_input(Event::Key(key(KeyCode::Char('u'))))?;
        assert_eq!(
            app.negotiation.as_ref().map(|n| n.session().history().len()),
            Some(1)
        );

        let due = responses.recv().await.expect("seller response");
        app.handle_counterparty_due(due);
        assert_eq!(app.state.status, "Seller countered at 1,050,000원");

        app.handle_input(Event::Key(key(KeyCode::Char('y'))))?;
        assert_eq!(
            app.negotiation.as_ref().and_then(|n| n.session().final_price()),
            Some(1_050_000)
        );

        app.handle_input(Event::Key(key(KeyCode::Esc)))?;
        assert!(app.negotiation.is_none());
        assert_eq!(app.state.status, "Deal closed at 1,050,000원");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_dialog_discards_the_pending_response() -> Result<()> {
        let mut app = UpdownApp::new(Catalog::sample(), AppConfig::default());
        let mut responses = app.responses_rx.take().expect("receiver");

        app.handle_input(Event::Key(key(KeyCode::Enter)))?;
        app.handle_input(Event::Key(key(KeyCode::Char('d'))))?;
        app.handle_input(Event::Key(key(KeyCode::Esc)))?;
        assert_eq!(app.state.status, "Negotiation closed without a deal");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(responses.try_recv().is_err());

        // reopening starts from scratch
        app.handle_input(Event::Key(key(KeyCode::Enter)))?;
        let session = app.negotiation.as_ref().map(|n| n.session().clone());
        assert!(session.is_some_and(|s| s.history().is_empty() && s.current_price() == 1_200_000));
        Ok(())
    }
}
