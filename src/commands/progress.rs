use crate::commands::nav::{load, NavOptions};
use crate::html::{Document, LayoutOptions};
use crate::nav::progress::ProgressUpdate;
use crate::nav::NavigationSession;
use crate::scroll_range::expand_scroll_ranges;
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub title: String,
    pub total_words: usize,
    pub samples: Vec<ProgressSample>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressSample {
    pub offset: f64,
    pub update: ProgressUpdate,
}

/// Scroll through `offsets`, delivering the resulting events to the
/// navigation session, and collect the progress after each step
pub fn sample<P: AsRef<Path>>(
    path: P,
    offsets: &str,
    options: &NavOptions,
    layout: LayoutOptions,
) -> Result<ProgressReport> {
    let (mut doc, mut session) = load(&path, options, layout)?;
    replay(&mut doc, &mut session, offsets)
}

/// Drive a mounted session through a scroll schedule
fn replay(
    doc: &mut Document,
    session: &mut NavigationSession,
    offsets: &str,
) -> Result<ProgressReport> {
    let viewport = session.requested_viewport();
    let offsets = expand_scroll_ranges(offsets, doc.max_scroll_top(viewport))?;

    let mut samples = Vec::with_capacity(offsets.len());
    for offset in offsets {
        doc.set_scroll_top(viewport, offset);
        let delivered = session.dispatch(doc).pop();
        // no event when the offset did not change
        let update = match delivered.or(session.last_update()) {
            Some(update) => update,
            None => session.update(doc),
        };
        samples.push(ProgressSample { offset, update });
    }

    Ok(ProgressReport {
        title: session.outline().title.clone(),
        total_words: session.outline().words,
        samples,
    })
}

pub fn run<P: AsRef<Path>>(
    path: P,
    offsets: &str,
    options: &NavOptions,
    layout: LayoutOptions,
) -> Result<()> {
    let report = sample(path, offsets, options, layout)?;

    println!("{} ({} words)", report.title, report.total_words);
    for s in &report.samples {
        println!(
            "{:>8.0}px  {:>5.1}%  bar {:>4}px  {} words remaining",
            s.offset,
            s.update.percent(),
            s.update.bar_height,
            s.update.remaining_words
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{attach, PageSelectors};

    fn long_page() -> String {
        format!(
            "<html><body><article><h1>Long</h1><p>{}</p></article></body></html>",
            "word ".repeat(4000)
        )
    }

    fn mount(options: LayoutOptions) -> (Document, NavigationSession) {
        let mut doc = Document::parse_with_options(&long_page(), options);
        // no #content: the document element is the viewport
        let session = attach(&mut doc, &PageSelectors::default(), None, 0.1).unwrap();
        (doc, session)
    }

    #[test]
    fn test_replay_reports_each_offset() {
        let (mut doc, mut session) = mount(LayoutOptions::default());
        let report = replay(&mut doc, &mut session, "0,1000").unwrap();

        assert_eq!(report.title, "Long");
        // "Long" runs into the first "word"
        assert_eq!(report.total_words, 4000);
        let offsets: Vec<_> = report.samples.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 1000.0]);
        assert_eq!(report.samples[0].update.progress, 0.0);
        assert!(report.samples[1].update.progress > 0.0);
    }

    #[test]
    fn test_replay_with_legacy_body_scroll() {
        let options = LayoutOptions {
            legacy_body_scroll: true,
            ..LayoutOptions::default()
        };
        let (mut doc, mut session) = mount(options);
        let root = doc.document_element();
        assert_eq!(session.requested_viewport(), root);

        let report = replay(&mut doc, &mut session, "0,1000,end").unwrap();
        let progress: Vec<_> = report.samples.iter().map(|s| s.update.progress).collect();
        assert_eq!(progress[0], 0.0);
        assert!(progress[1] > 0.0);
        assert!(progress[2] > progress[1]);
        assert_eq!(session.scroll_source(), doc.body());
        assert!(report.samples[2].update.remaining_words < report.total_words as i64);
    }
}
