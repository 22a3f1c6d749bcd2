//! Plain-text presenter.
//!
//! Squares are drawn as three-character cells; the brackets around the
//! piece letter carry the highlight:
//!
//! | cell  | meaning          |
//! |-------|------------------|
//! | `[P]` | selected         |
//! | `(.)` | move target      |
//! | `{p}` | capture target   |
//! | `<.>` | drop target      |

use std::io::{self, Write};

use ecochess_model::Square;
use ecochess_net::TransportState;
use ecochess_sync::format_optional;
use ecochess_sync::{
    BoardView, ClockView, FinishNotice, Frame, Highlight, Presenter, ShopItem, ShopView,
};

/// Presenter writing to any [`Write`] sink, normally stdout.
pub struct TerminalPresenter<W: Write> {
    out: W,
    /// Redraw the clock line in place on every tick.
    live_clock: bool,
    last_clock: Option<String>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, live_clock: bool) -> Self {
        Self {
            out,
            live_clock,
            last_clock: None,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        let clock = clock_line(frame.clocks);
        writeln!(self.out)?;
        for line in board_lines(&frame.board) {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "{}", shop_line(&frame.shop))?;
        writeln!(self.out, "{clock}")?;
        writeln!(
            self.out,
            "{} [{}]",
            frame.status,
            transport_label(frame.transport)
        )?;
        self.last_clock = Some(clock);
        self.out.flush()
    }

    fn write_clock(&mut self, clocks: Option<ClockView>) -> io::Result<()> {
        let line = clock_line(clocks);
        if self.last_clock.as_deref() == Some(line.as_str()) {
            return Ok(());
        }
        write!(self.out, "\r{line}\x1b[K")?;
        self.last_clock = Some(line);
        self.out.flush()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, frame: &Frame) {
        if let Err(e) = self.write_frame(frame) {
            tracing::warn!("failed to draw frame: {e}");
        }
    }

    fn clocks(&mut self, clocks: Option<ClockView>) {
        if !self.live_clock {
            return;
        }
        if let Err(e) = self.write_clock(clocks) {
            tracing::warn!("failed to draw clocks: {e}");
        }
    }

    fn game_finished(&mut self, notice: &FinishNotice) {
        let result = writeln!(self.out, "\n*** {notice} ***").and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("failed to draw finish notice: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Board rows with rank labels on the left and file labels underneath.
pub fn board_lines(view: &BoardView) -> Vec<String> {
    let rows = view.rows();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    for row in &rows {
        let Some(first) = row.first() else {
            continue;
        };
        let cells: String = row.iter().map(|&square| cell(view, square)).collect();
        lines.push(format!("{} {cells}", first.rank() + 1));
    }
    let files: String = rows
        .first()
        .map(|row| {
            row.iter()
                .map(|square| format!(" {} ", char::from(b'a' + square.file())))
                .collect()
        })
        .unwrap_or_default();
    lines.push(format!("  {files}"));
    lines
}

fn cell(view: &BoardView, square: Square) -> String {
    let glyph = view.piece_at(square).map_or('.', |piece| piece.letter());
    let (open, close) = match view.highlight(square) {
        Highlight::None => (' ', ' '),
        Highlight::Selected => ('[', ']'),
        Highlight::Move => ('(', ')'),
        Highlight::Capture => ('{', '}'),
        Highlight::Drop => ('<', '>'),
    };
    format!("{open}{glyph}{close}")
}

/// Coins and the buyable quantity of each kind. Dimmed items are marked
/// with `-`, the selected kind is bracketed.
pub fn shop_line(shop: &ShopView) -> String {
    let items: Vec<String> = shop.items.iter().map(shop_item).collect();
    let mut line = format!(
        "coins W={} B={} | {}",
        shop.coins.white,
        shop.coins.black,
        items.join(" ")
    );
    if shop.locked {
        line.push_str(" | locked: in check");
    }
    line
}

fn shop_item(item: &ShopItem) -> String {
    let text = format!("{}:{}x{}", item.kind.letter(), item.cost, item.quantity);
    match (item.selected, item.dimmed) {
        (true, _) => format!("[{text}]"),
        (false, true) => format!("-{text}"),
        (false, false) => text,
    }
}

pub fn clock_line(clocks: Option<ClockView>) -> String {
    format!(
        "W {}  B {}  game {}",
        format_optional(clocks.map(|c| c.white)),
        format_optional(clocks.map(|c| c.black)),
        format_optional(clocks.map(|c| c.global)),
    )
}

pub fn transport_label(state: TransportState) -> &'static str {
    match state {
        TransportState::Disconnected => "offline",
        TransportState::Connecting => "connecting",
        TransportState::Connected => "live",
        TransportState::Polling => "polling",
    }
}
