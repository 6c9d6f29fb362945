//! Gateway-quote annotation of TSV rows.

use crate::align::{AlignOptions, Occurrence, QuoteSpec, align_quote};
use crate::error::Result;
use crate::scripture::ParsedBook;

use super::{Pivot, QuoteMemo, TsvRow, bucket_rows, parse_tsv};

/// Column holding the gateway quote for target Bible `index`.
pub fn gl_quote_column(index: usize) -> String {
    format!("GLQuote{index}")
}

/// Adds `GLQuote{i}` columns to TSV rows, one per target Bible.
pub struct Annotator<'a> {
    origin: Option<&'a ParsedBook>,
    targets: &'a [ParsedBook],
    options: AlignOptions,
    memo: Option<&'a QuoteMemo>,
}

impl<'a> Annotator<'a> {
    pub fn new(origin: Option<&'a ParsedBook>, targets: &'a [ParsedBook]) -> Self {
        Self {
            origin,
            targets,
            options: AlignOptions::default(),
            memo: None,
        }
    }

    pub fn with_options(mut self, options: AlignOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_memo(mut self, memo: &'a QuoteMemo) -> Self {
        self.memo = Some(memo);
        self
    }

    /// Gateway quote of one row for one target.
    fn gl_quote(&self, row: &TsvRow, index: usize, target: &ParsedBook) -> String {
        let quote = row.quote().trim();
        let occurrence = row.occurrence();
        if quote.is_empty() || quote.ends_with(':') || occurrence == Occurrence::None {
            return String::new();
        }
        let Some(origin) = self.origin.filter(|o| !o.is_empty()) else {
            return String::new();
        };

        let spec = QuoteSpec::new(quote, row.reference(), occurrence);
        let compute = || align_quote(&spec, origin, target, &self.options);
        match self.memo {
            Some(memo) => {
                let key = QuoteMemo::key(
                    &spec,
                    index,
                    &self.options.delimiter,
                    &origin.fingerprint,
                    &target.fingerprint,
                );
                memo.get_or_compute(key, compute)
            }
            None => compute(),
        }
    }

    pub fn annotate_row(&self, row: &mut TsvRow) {
        for (index, target) in self.targets.iter().enumerate() {
            let quote = self.gl_quote(row, index, target);
            row.set(&gl_quote_column(index), quote);
        }
    }

    pub fn annotate(&self, pivot: &mut Pivot) {
        let mut rows = 0;
        for verses in pivot.values_mut() {
            for row in verses.values_mut().flatten() {
                self.annotate_row(row);
                rows += 1;
            }
        }
        log::info!("annotated {rows} rows for {} target bibles", self.targets.len());
    }
}

/// Parse, bucket and annotate a TSV resource.
///
/// Without an origin book every `GLQuote{i}` is empty.
pub fn pivot_tsv(
    text: &str,
    origin: Option<&ParsedBook>,
    targets: &[ParsedBook],
    options: &AlignOptions,
) -> Result<Pivot> {
    let mut pivot = bucket_rows(parse_tsv(text)?);
    Annotator::new(origin, targets)
        .with_options(options.clone())
        .annotate(&mut pivot);
    Ok(pivot)
}
