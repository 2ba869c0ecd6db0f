//! Splitting a single `gnc:book`.

use crate::account::AccountTree;
use crate::amount::Amount;
use crate::document::Element;
use crate::namespaces::Namespaces;
use crate::opening::{self, GuidSource, Statement};
use crate::window::{DateWindow, Placement, PostedDate};
use crate::{OpeningBalances, Result, SplitError, SplitOptions};

/// What happened to the transactions of one book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookSummary {
    /// Transactions left in the book, including a synthesized opening balance
    /// transaction.
    pub kept: usize,
    pub prior: usize,
    pub later: usize,
    /// Accounts that received an opening balance.
    pub opening_balances: usize,
}

pub(crate) struct BookSplit<'a> {
    pub ns: &'a Namespaces,
    pub options: &'a SplitOptions,
    /// Offset of the first transaction of the document, reused for every
    /// synthesized date.
    pub offset: &'a mut Option<String>,
    pub guids: &'a mut dyn GuidSource,
}

impl BookSplit<'_> {
    pub fn run(&mut self, book: &mut Element) -> Result<(BookSummary, Vec<Statement>)> {
        let ns = self.ns;
        let mut tree = AccountTree::from_book(book, ns)?;
        tracing::debug!(accounts = tree.len(), "read account tree");

        let mut summary = BookSummary::default();
        let placements = self.classify(book, &mut tree, &mut summary)?;

        let transaction = ns.name("gnc:transaction")?;
        let mut placements = placements.into_iter();
        book.retain_elements(|element| {
            !element.is(&transaction) || placements.next() == Some(Placement::Within)
        });

        let mut statements = Vec::new();
        if summary.prior > 0 {
            let start_year = self.options.window.start_year();
            match self.options.opening_balances {
                OpeningBalances::Transaction => {
                    let offset = self.offset.as_deref().ok_or_else(|| {
                        SplitError::Malformed("no transaction carried a time zone".to_string())
                    })?;
                    let opening =
                        opening::opening_transaction(&tree, ns, start_year, offset, self.guids)?;
                    if let Some(opening) = opening {
                        book.push_line(opening.element);
                        summary.kept += 1;
                        summary.opening_balances = opening.accounts;
                    }
                }
                OpeningBalances::Statements => {
                    statements = opening::statements(&tree, start_year);
                    summary.opening_balances =
                        statements.iter().map(|statement| statement.entries.len()).sum();
                }
                OpeningBalances::Discard => {}
            }
        }

        rewrite_transaction_count(book, ns, summary.kept)?;

        tracing::info!(
            kept = summary.kept,
            prior = summary.prior,
            later = summary.later,
            opening_balances = summary.opening_balances,
            "split book"
        );
        Ok((summary, statements))
    }

    /// Place every transaction in the window, adding the splits of those
    /// before it to the account balances.
    fn classify(
        &mut self,
        book: &Element,
        tree: &mut AccountTree,
        summary: &mut BookSummary,
    ) -> Result<Vec<Placement>> {
        let ns = self.ns;
        let window: &DateWindow = &self.options.window;
        let mut placements = Vec::new();
        for transaction in book.find_all(ns, "gnc:transaction")? {
            let posted =
                PostedDate::parse(transaction.required_text(ns, "trn:date-posted/ts:date")?)?;
            if self.offset.is_none() {
                *self.offset = Some(posted.offset.clone());
            }

            let placement = window.classify(posted.local);
            match placement {
                Placement::Within => summary.kept += 1,
                Placement::Before => {
                    summary.prior += 1;
                    for split in transaction.find_all(ns, "trn:splits/trn:split")? {
                        let quantity: Amount =
                            split.required_text(ns, "split:quantity")?.parse()?;
                        tree.accumulate(split.required_text(ns, "split:account")?, &quantity)?;
                    }
                }
                Placement::After => summary.later += 1,
            }
            placements.push(placement);
        }
        Ok(placements)
    }
}

fn rewrite_transaction_count(book: &mut Element, ns: &Namespaces, count: usize) -> Result<()> {
    let count_data = ns.name("gnc:count-data")?;
    let count_type = ns.name("cd:type")?;
    for element in book.elements_mut() {
        if element.is(&count_data) && element.attribute(&count_type) == Some("transaction") {
            element.set_text(count.to_string());
        }
    }
    Ok(())
}
