/*!
 * Walk a document's text elements through the orchestrator.
 *
 * A run goes through four steps:
 * 1. a cleanup sweep over elements holding lone surrogates
 * 2. extraction of the eligible elements of the visited containers
 * 3. translation and write-back, one element at a time
 * 4. a final scrub of every text element in the document
 */

use log::{debug, info, warn};

use crate::document::{ElementInfo, ElementKind, ElementRef, HostDocument, WriteBackStatus};
use crate::report::RunReport;
use crate::text::{clean_for_log, CleanText, RawText, Sanitizer};
use crate::translation::cache::truncate_text;
use crate::translation::eligibility::{self, Verdict};
use crate::translation::{Direction, Orchestrator, Outcome};

/// Font used for rich-text write-back when none is configured
pub const DEFAULT_FONT: &str = "SimSun";

/// One eligible element and its translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationItem {
    pub element: ElementRef,
    pub kind: ElementKind,
    /// Text as read from the element
    pub original: RawText,
    pub layer: String,
    /// Container label
    pub location: String,
    pub translated: Option<CleanText>,
}

/// Progress of the translation step
#[derive(Debug)]
pub struct ItemProgress<'a> {
    /// 1-based position
    pub index: usize,
    pub total: usize,
    pub item: &'a TranslationItem,
    pub outcome: &'a Outcome,
}

/// Visit the text elements of the top-level containers and, when
/// `include_nested` is set, of the named block definitions
pub fn for_each_text_element<D, F>(document: &D, include_nested: bool, mut visit: F)
where
    D: HostDocument + ?Sized,
    F: FnMut(&ElementInfo),
{
    let elements = document.text_elements();
    for element in elements.iter().filter(|e| e.container.is_top_level()) {
        visit(element);
    }
    if include_nested {
        for element in elements
            .iter()
            .filter(|e| !e.container.is_top_level() && !e.container.is_anonymous_block())
        {
            visit(element);
        }
    }
}

/// Rich-text value carrying a font that covers the target script
pub fn wrap_rich_text(text: &str, font: &str) -> String {
    format!("{{\\f{}|b0|i0|c134;{}}}", font, text)
}

/// Drives one document through extraction, translation and cleanup
#[derive(Debug, Clone)]
pub struct DocumentWalker {
    sanitizer: Sanitizer,
    include_blocks: bool,
    font: String,
}

impl Default for DocumentWalker {
    fn default() -> Self {
        Self::new(false, DEFAULT_FONT)
    }
}

impl DocumentWalker {
    pub fn new(include_blocks: bool, font: impl Into<String>) -> Self {
        Self {
            sanitizer: Sanitizer::new(),
            include_blocks,
            font: font.into(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Clean elements holding lone surrogates before anything reads them
    pub fn sweep_surrogates<D: HostDocument + ?Sized>(&self, document: &mut D) -> usize {
        let mut swept = 0;
        for element in document.text_elements() {
            let Ok(raw) = document.read_text(element.id) else {
                continue;
            };
            if raw.has_lone_surrogates() && self.rewrite(document, &element, &raw) {
                swept += 1;
            }
        }
        if swept > 0 {
            info!("Removed lone surrogates from {} elements", swept);
        }
        swept
    }

    /// Scrub every text element of the document, blocks included
    pub fn final_sweep<D: HostDocument + ?Sized>(&self, document: &mut D) -> usize {
        let mut swept = 0;
        for element in document.text_elements() {
            let Ok(raw) = document.read_text(element.id) else {
                continue;
            };
            if self.rewrite(document, &element, &raw) {
                swept += 1;
            }
        }
        info!("Final cleanup rewrote {} elements", swept);
        swept
    }

    /// Scrub one element; true when its text was replaced
    fn rewrite<D: HostDocument + ?Sized>(&self, document: &mut D, element: &ElementInfo, raw: &RawText) -> bool {
        let scrubbed = self.sanitizer.scrub(raw);
        if !raw.has_lone_surrogates() && scrubbed == raw.to_string_lossy() {
            return false;
        }
        debug!(
            "Cleaning {} {} ({}): '{}' -> '{}'",
            element.kind,
            element.id,
            element.container,
            truncate_text(&raw.escaped(), 30),
            truncate_text(&clean_for_log(&scrubbed), 30)
        );
        match document.write_back(element.id, &scrubbed) {
            WriteBackStatus::Written => true,
            WriteBackStatus::Unchanged => false,
            WriteBackStatus::Failed(e) => {
                warn!("Cleanup of {} ({}) failed: {}", element.id, element.container, e);
                false
            }
        }
    }

    /// Collect the eligible elements of the visited containers
    pub fn extract<D: HostDocument + ?Sized>(
        &self,
        document: &D,
        direction: Direction,
        report: &mut RunReport,
    ) -> Vec<TranslationItem> {
        let mut items = Vec::new();
        for_each_text_element(document, self.include_blocks, |element| {
            if !element.kind.is_translatable() {
                return;
            }
            report.total += 1;

            let raw = match document.read_text(element.id) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Cannot read {} ({}): {}", element.id, element.container, e);
                    report.skipped += 1;
                    return;
                }
            };
            let cleaned = self.sanitizer.clean(&raw);
            if let Verdict::Skip(reason) = eligibility::check(&cleaned, direction) {
                debug!("Skipping {} ({}): {}", element.id, element.container, reason);
                report.skipped += 1;
                return;
            }

            items.push(TranslationItem {
                element: element.id,
                kind: element.kind,
                original: raw,
                layer: element.layer.clone(),
                location: element.container.label(),
                translated: None,
            });
        });

        info!(
            "Extracted {} text elements ({})",
            items.len(),
            if self.include_blocks { "blocks included" } else { "blocks excluded" }
        );
        items
    }

    /// Value written into an element of `kind`
    pub fn format_for(&self, kind: ElementKind, text: &str) -> String {
        if kind.is_rich() {
            wrap_rich_text(text, &self.font)
        } else {
            text.to_string()
        }
    }

    /// Translate each item and write changed results back
    pub async fn translate_items<D, F>(
        &self,
        document: &mut D,
        orchestrator: &mut Orchestrator,
        items: &mut [TranslationItem],
        report: &mut RunReport,
        mut on_progress: F,
    ) where
        D: HostDocument + ?Sized,
        F: FnMut(ItemProgress<'_>),
    {
        let total = items.len();
        for (position, item) in items.iter_mut().enumerate() {
            let result = orchestrator.translate(&item.original).await;
            let cleaned_original = self.sanitizer.clean(&item.original);
            item.translated = Some(result.text.clone());

            match &result.outcome {
                Outcome::Fallback(_) => report.fallback += 1,
                _ if result.text == cleaned_original => report.unchanged += 1,
                _ => {
                    let value = self.format_for(item.kind, &result.text);
                    match document.write_back(item.element, &value) {
                        WriteBackStatus::Written => report.translated += 1,
                        WriteBackStatus::Unchanged => report.unchanged += 1,
                        WriteBackStatus::Failed(e) => {
                            warn!(
                                "Write-back failed for {} ({}), keeping original: {}",
                                item.element, item.location, e
                            );
                            item.translated = None;
                            report.write_failures += 1;
                        }
                    }
                }
            }

            on_progress(ItemProgress {
                index: position + 1,
                total,
                item,
                outcome: &result.outcome,
            });
        }
    }

    /// All four steps; returns the translated items
    pub async fn run<D, F>(
        &self,
        document: &mut D,
        orchestrator: &mut Orchestrator,
        report: &mut RunReport,
        on_progress: F,
    ) -> Vec<TranslationItem>
    where
        D: HostDocument + ?Sized,
        F: FnMut(ItemProgress<'_>),
    {
        report.swept += self.sweep_surrogates(document);
        let mut items = self.extract(document, orchestrator.direction(), report);
        self.translate_items(document, orchestrator, &mut items, report, on_progress)
            .await;
        report.swept += self.final_sweep(document);
        items
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }
}
