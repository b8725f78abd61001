//! Plain-text pages and the line-command driver for `highvocab page`.

use std::str::FromStr;

use anyhow::{Context, bail};
use highvocab_core::{Document, NodeSpec, PageEvent, PageSnapshot};
use highvocab_types::Point;
use kanal::AsyncSender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::oneshot;

const DEFAULT_SCROLL: f64 = 100.0;

/// One `<p>` per non-blank line.
pub fn document_from_text(text: &str) -> anyhow::Result<Document> {
    let mut doc = Document::new();
    let paragraphs = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(paragraph)
        .collect();
    let body = doc.body();
    doc.append_specs(body, paragraphs)?;
    doc.take_mutations();
    Ok(doc)
}

fn paragraph(text: &str) -> NodeSpec {
    NodeSpec::element("p", &[], vec![NodeSpec::text(text)])
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageCommand {
    Hover(Point),
    Select(Point, Point),
    Out,
    Click,
    Save,
    Scroll(f64),
    Append(String),
    Show,
    Quit,
}

impl FromStr for PageCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let numbers = || -> anyhow::Result<Vec<f64>> {
            rest.split_whitespace()
                .map(|n| n.parse::<f64>().with_context(|| format!("'{n}' is not a number")))
                .collect()
        };

        let command = match name {
            "hover" => match numbers()?.as_slice() {
                &[x, y] => PageCommand::Hover(Point::new(x, y)),
                _ => bail!("usage: hover X Y"),
            },
            "select" => match numbers()?.as_slice() {
                &[x1, y1, x2, y2] => PageCommand::Select(Point::new(x1, y1), Point::new(x2, y2)),
                _ => bail!("usage: select X1 Y1 X2 Y2"),
            },
            "scroll" => match numbers()?.as_slice() {
                &[] => PageCommand::Scroll(DEFAULT_SCROLL),
                &[dy] => PageCommand::Scroll(dy),
                _ => bail!("usage: scroll [DY]"),
            },
            "append" if !rest.is_empty() => PageCommand::Append(rest.to_string()),
            "append" => bail!("usage: append TEXT"),
            "out" => PageCommand::Out,
            "click" => PageCommand::Click,
            "save" => PageCommand::Save,
            "show" => PageCommand::Show,
            "quit" | "exit" => PageCommand::Quit,
            other => bail!("unknown command '{other}'"),
        };
        Ok(command)
    }
}

/// Feed commands from `input` to the page session until `quit` or EOF.
pub async fn drive<R>(input: R, events: AsyncSender<PageEvent>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut scroll_y = 0.0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<PageCommand>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        tracing::debug!("Page command {command:?}");

        match command {
            PageCommand::Quit => break,
            PageCommand::Show => {
                let snapshot = inspect(&events).await?;
                println!("{}", snapshot.html);
                println!("markers: {}", snapshot.markers);
            }
            PageCommand::Scroll(dy) => {
                scroll_y += dy;
                let offset = Point::new(0.0, scroll_y);
                events.send(PageEvent::Scroll { offset }).await?;
            }
            command => {
                let snapshot = inspect(&events).await?;
                match to_event(command, &snapshot) {
                    Some(event) => events.send(event).await?,
                    None => eprintln!("no tooltip on the page yet"),
                }
            }
        }

        print_status(&inspect(&events).await?);
    }
    Ok(())
}

fn to_event(command: PageCommand, snapshot: &PageSnapshot) -> Option<PageEvent> {
    let event = match command {
        PageCommand::Hover(client) => PageEvent::PointerMove { client },
        PageCommand::Select(from, to) => PageEvent::SelectBetween { from, to },
        PageCommand::Out => PageEvent::PointerOut {
            target: snapshot.body,
            related_target: None,
        },
        PageCommand::Click => PageEvent::Click {
            target: snapshot.tooltip_node?,
        },
        PageCommand::Save => PageEvent::Click {
            target: snapshot.save_button?,
        },
        PageCommand::Append(text) => PageEvent::InsertNodes {
            parent: snapshot.body,
            nodes: vec![paragraph(&text)],
        },
        PageCommand::Scroll(_) | PageCommand::Show | PageCommand::Quit => return None,
    };
    Some(event)
}

pub async fn inspect(events: &AsyncSender<PageEvent>) -> anyhow::Result<PageSnapshot> {
    let (reply, snapshot) = oneshot::channel();
    events.send(PageEvent::Inspect(reply)).await?;
    snapshot.await.context("page session stopped")
}

fn print_status(snapshot: &PageSnapshot) {
    let view = &snapshot.tooltip;
    if !view.visible {
        println!("[hidden]");
        return;
    }
    println!(
        "[{}] {}{} at ({}, {})",
        view.current_word.as_deref().unwrap_or_default(),
        view.text.label(),
        if view.save_visible { " [Save]" } else { "" },
        view.position.x,
        view.position.y,
    );
}
