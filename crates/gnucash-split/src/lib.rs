//! Extract a range of years from a GnuCash XML ledger.
//!
//! Transactions outside the window are removed. The balances of those before
//! it are carried over, either as one opening balance transaction inside the
//! ledger or as QIF statements next to it, so every account still starts the
//! window with the balance the full ledger would show.

mod account;
mod amount;
mod book;
pub mod container;
mod document;
mod error;
mod namespaces;
mod opening;
mod window;

#[cfg(test)]
mod testutils;

pub use account::{Account, AccountKind, AccountTree, Commodity, FullNames};
pub use amount::Amount;
pub use book::BookSummary;
pub use container::Compression;
pub use document::{Document, Element};
pub use error::{Result, SplitError};
pub use namespaces::{Name, Namespaces};
pub use opening::{GuidSource, RandomGuids, Statement, StatementEntry};
pub use window::{DEFAULT_END_YEAR, DateWindow, Placement, PostedDate};

use std::path::PathBuf;

/// How the balances of transactions before the window are carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpeningBalances {
    /// Add one transaction restating every balance to the book.
    #[default]
    Transaction,
    /// Return QIF statements, one per commodity.
    Statements,
    /// Start every account from zero.
    Discard,
}

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub window: DateWindow,
    pub opening_balances: OpeningBalances,
}

#[derive(Debug, Default)]
pub struct SplitReport {
    /// One entry per book, in document order.
    pub books: Vec<BookSummary>,
    pub statements: Vec<Statement>,
}

/// Split every book of `document` in place.
pub fn split_document(
    document: &mut Document,
    ns: &Namespaces,
    options: &SplitOptions,
    guids: &mut dyn GuidSource,
) -> Result<SplitReport> {
    let root = document.root_mut();
    if root.local_name() != "gnc-v2" || root.namespace().is_some() {
        return Err(SplitError::Malformed(format!(
            "expected a GnuCash v2 file, found <{}>",
            root.name()
        )));
    }

    let book_name = ns.name("gnc:book")?;
    let mut offset = None;
    let mut report = SplitReport::default();
    for book in root.elements_mut().filter(|element| element.is(&book_name)) {
        let (summary, statements) = book::BookSplit {
            ns,
            options,
            offset: &mut offset,
            guids: &mut *guids,
        }
        .run(book)?;
        report.books.push(summary);
        report.statements.extend(statements);
    }
    Ok(report)
}

/// A complete run: read `input`, split it, then write `output` and any
/// statements.
#[derive(Debug, Clone)]
pub struct SplitJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub compression: Compression,
    pub statement_dir: PathBuf,
    pub namespaces: Namespaces,
    pub options: SplitOptions,
}

impl SplitJob {
    /// Nothing is written unless the whole document could be split.
    pub fn run(&self) -> Result<SplitReport> {
        let mut document = container::read_document(&self.input)?;
        let report = split_document(
            &mut document,
            &self.namespaces,
            &self.options,
            &mut RandomGuids,
        )?;

        // statements first, the ledger only once they are in place
        if !report.statements.is_empty() {
            std::fs::create_dir_all(&self.statement_dir)?;
        }
        for statement in &report.statements {
            let path = self.statement_dir.join(statement.file_name());
            std::fs::write(&path, statement.render())?;
            tracing::info!(path = %path.display(), "wrote opening balances");
        }

        container::write_document(&document, &self.output, self.compression)?;
        tracing::info!(path = %self.output.display(), "wrote ledger");
        Ok(report)
    }
}
