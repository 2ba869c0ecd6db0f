use std::fmt::Write as _;

use crate::document::{Document, Element};
use crate::namespaces::Namespaces;
use crate::opening::GuidSource;

const NAMESPACES: &[&str] = &[
    "gnc", "cd", "book", "slot", "cmdty", "price", "ts", "act", "trn", "split", "recurrence",
    "cust", "bgt", "addr", "vendor", "sx",
];

/// Renders small GnuCash v2 ledgers with a single book.
#[derive(Debug, Default, Clone)]
pub struct LedgerBuilder {
    accounts: Vec<String>,
    transactions: Vec<String>,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        LedgerBuilder::default()
    }

    /// An account in EUR. Without a parent it is written like a root account.
    pub fn account(self, id: &str, name: &str, kind: &str, parent: Option<&str>) -> Self {
        match parent {
            Some(parent) => self.commodity_account(id, name, kind, parent, "ISO4217", "EUR"),
            None => {
                let xml = format!(
                    r#"<gnc:account version="2.0.0">
  <act:name>{name}</act:name>
  <act:id type="guid">{id}</act:id>
  <act:type>{kind}</act:type>
</gnc:account>
"#
                );
                self.with_account(xml)
            }
        }
    }

    pub fn commodity_account(
        self,
        id: &str,
        name: &str,
        kind: &str,
        parent: &str,
        space: &str,
        commodity: &str,
    ) -> Self {
        let xml = format!(
            r#"<gnc:account version="2.0.0">
  <act:name>{name}</act:name>
  <act:id type="guid">{id}</act:id>
  <act:type>{kind}</act:type>
  <act:commodity>
    <cmdty:space>{space}</cmdty:space>
    <cmdty:id>{commodity}</cmdty:id>
  </act:commodity>
  <act:commodity-scu>100</act:commodity-scu>
  <act:parent type="guid">{parent}</act:parent>
</gnc:account>
"#
        );
        self.with_account(xml)
    }

    fn with_account(mut self, xml: String) -> Self {
        self.accounts.push(xml);
        self
    }

    /// A transaction posted at `posted` with `(account, quantity)` splits.
    pub fn transaction(mut self, id: &str, posted: &str, splits: &[(&str, &str)]) -> Self {
        let mut xml = format!(
            r#"<gnc:transaction version="2.0.0">
  <trn:id type="guid">{id}</trn:id>
  <trn:currency>
    <cmdty:space>ISO4217</cmdty:space>
    <cmdty:id>EUR</cmdty:id>
  </trn:currency>
  <trn:date-posted>
    <ts:date>{posted}</ts:date>
  </trn:date-posted>
  <trn:date-entered>
    <ts:date>{posted}</ts:date>
  </trn:date-entered>
  <trn:description>{id}</trn:description>
  <trn:splits>
"#
        );
        for (index, (account, quantity)) in splits.iter().enumerate() {
            let _ = write!(
                xml,
                r#"    <trn:split>
      <split:id type="guid">{id}-{index}</split:id>
      <split:reconciled-state>n</split:reconciled-state>
      <split:value>{quantity}</split:value>
      <split:quantity>{quantity}</split:quantity>
      <split:account type="guid">{account}</split:account>
    </trn:split>
"#
            );
        }
        xml.push_str("  </trn:splits>\n</gnc:transaction>\n");
        self.transactions.push(xml);
        self
    }

    pub fn render(&self) -> String {
        let mut book = String::new();
        let _ = writeln!(
            book,
            r#"<gnc:count-data cd:type="account">{}</gnc:count-data>"#,
            self.accounts.len()
        );
        let _ = writeln!(
            book,
            r#"<gnc:count-data cd:type="transaction">{}</gnc:count-data>"#,
            self.transactions.len()
        );
        for account in &self.accounts {
            book.push_str(account);
        }
        for transaction in &self.transactions {
            book.push_str(transaction);
        }
        Self::wrap(&book)
    }

    pub fn document(&self) -> Document {
        Document::read(self.render().as_bytes()).unwrap()
    }

    /// A complete file with `book` as the content of its only book.
    pub fn wrap(book: &str) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<gnc-v2");
        for alias in NAMESPACES {
            let _ = write!(
                xml,
                "\n     xmlns:{alias}=\"http://www.gnucash.org/XML/{alias}\""
            );
        }
        xml.push_str(">\n<gnc:count-data cd:type=\"book\">1</gnc:count-data>\n");
        xml.push_str("<gnc:book version=\"2.0.0\">\n<book:id type=\"guid\">book</book:id>\n");
        xml.push_str(book);
        xml.push_str("</gnc:book>\n</gnc-v2>\n");
        xml
    }
}

pub fn parse_book(document: &Document) -> &Element {
    document
        .root()
        .required(&Namespaces::gnucash(), "gnc:book")
        .unwrap()
}

/// `00000000000000000000000000000001`, `...02`, ...
#[derive(Debug, Default)]
pub struct SequentialGuids(u32);

impl GuidSource for SequentialGuids {
    fn next_guid(&mut self) -> String {
        self.0 += 1;
        format!("{:032x}", self.0)
    }
}
