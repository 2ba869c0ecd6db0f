//! Carrying the balances of dropped transactions over into the extracted ledger.
//!
//! Either one transaction restating every non-zero balance is added to the
//! book, or the balances are written out as QIF statements (one per commodity)
//! to be imported against an opening balances equity account.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use uuid::Uuid;

use crate::account::{AccountTree, Commodity, FullNames};
use crate::amount::Amount;
use crate::document::Element;
use crate::namespaces::Namespaces;
use crate::{Result, SplitError};

const ISO4217: &str = "ISO4217";

/// Hands out identifiers for synthesized transactions and splits.
pub trait GuidSource {
    fn next_guid(&mut self) -> String;
}

/// Random version 4 UUIDs in GnuCash's 32 hex digit form.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomGuids;

impl GuidSource for RandomGuids {
    fn next_guid(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[derive(Debug)]
pub struct OpeningTransaction {
    pub element: Element,
    /// Number of accounts given a split.
    pub accounts: usize,
}

/// Build the transaction that restates every non-zero balance in `tree`, dated
/// at the last second of the year before `start_year`. Returns `None` when all
/// balances are zero.
pub fn opening_transaction(
    tree: &AccountTree,
    ns: &Namespaces,
    start_year: i32,
    offset: &str,
    guids: &mut dyn GuidSource,
) -> Result<Option<OpeningTransaction>> {
    let accounts: Vec<_> = tree.with_balance().map(|(_, account)| account).collect();
    if accounts.is_empty() {
        return Ok(None);
    }

    let commodities: Vec<&Commodity> = accounts
        .iter()
        .filter_map(|account| account.commodity.as_ref())
        .collect();
    let currency = commodities
        .iter()
        .find(|commodity| commodity.space.as_deref() == Some(ISO4217))
        .or(commodities.first())
        .ok_or_else(|| {
            SplitError::Malformed("no commodity for the opening balance transaction".to_string())
        })?;

    let year = start_year - 1;
    let date = format!("{year}-12-31 23:59:59 {offset}");

    let mut splits = Element::new(ns, "trn:splits")?;
    for account in &accounts {
        let amount = account.balance.to_fraction();
        tracing::debug!(account = %account.id, %amount, "opening balance");
        let split = Element::new(ns, "trn:split")?
            .with_child(
                Element::new(ns, "split:id")?
                    .with_attribute(ns, "type", "guid")?
                    .with_text(guids.next_guid()),
            )
            .with_child(Element::new(ns, "split:reconciled-state")?.with_text("n"))
            .with_child(Element::new(ns, "split:value")?.with_text(amount.as_str()))
            .with_child(Element::new(ns, "split:quantity")?.with_text(amount.as_str()))
            .with_child(
                Element::new(ns, "split:account")?
                    .with_attribute(ns, "type", "guid")?
                    .with_text(account.id.as_str()),
            );
        splits.push_line(split);
    }

    let element = Element::new(ns, "gnc:transaction")?
        .with_attribute(ns, "version", "2.0.0")?
        .with_child(
            Element::new(ns, "trn:id")?
                .with_attribute(ns, "type", "guid")?
                .with_text(guids.next_guid()),
        )
        .with_child(
            Element::new(ns, "trn:currency")?
                .with_child(
                    Element::new(ns, "cmdty:space")?
                        .with_text(currency.space.as_deref().unwrap_or(ISO4217)),
                )
                .with_child(Element::new(ns, "cmdty:id")?.with_text(currency.id.as_str())),
        )
        .with_child(
            Element::new(ns, "trn:date-posted")?
                .with_child(Element::new(ns, "ts:date")?.with_text(date.as_str())),
        )
        .with_child(
            Element::new(ns, "trn:date-entered")?
                .with_child(Element::new(ns, "ts:date")?.with_text(date.as_str())),
        )
        .with_child(
            Element::new(ns, "trn:description")?
                .with_text(format!("Balance as of 31 December {year}")),
        )
        .with_child(splits);

    Ok(Some(OpeningTransaction {
        element,
        accounts: accounts.len(),
    }))
}

/// Opening balances of one commodity, as a QIF statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub start_year: i32,
    pub commodity: String,
    pub entries: Vec<StatementEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementEntry {
    /// Full account name, e.g. `Assets:Checking`.
    pub account: String,
    /// The account description, written as the split memo.
    pub memo: Option<String>,
    /// The balance from the opening balances account's point of view, so an
    /// asset holding 100 is listed as -100.
    pub amount: Amount,
}

/// Group the non-zero balances of balance sheet accounts by commodity.
pub fn statements(tree: &AccountTree, start_year: i32) -> Vec<Statement> {
    let mut names = FullNames::new();
    let mut grouped: BTreeMap<&str, Vec<StatementEntry>> = BTreeMap::new();
    for (index, account) in tree.with_balance() {
        let Some(commodity) = &account.commodity else {
            continue;
        };
        if !account.kind.is_balance_sheet() {
            continue;
        }
        grouped
            .entry(commodity.id.as_str())
            .or_default()
            .push(StatementEntry {
                account: names.resolve(tree, index).to_string(),
                memo: account.description.clone(),
                amount: -&account.balance,
            });
    }

    grouped
        .into_iter()
        .map(|(commodity, entries)| Statement {
            start_year,
            commodity: commodity.to_string(),
            entries,
        })
        .collect()
}

impl Statement {
    pub fn file_name(&self) -> String {
        format!("{}{}.qif", self.start_year, self.commodity)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("!Account\n");
        let _ = writeln!(out, "NEquity:Opening Balances:{}", self.commodity);
        out.push_str("TOth A\n^\n!Type:Oth A\n");
        let _ = writeln!(out, "D{}-01-01", self.start_year);
        for entry in &self.entries {
            let _ = writeln!(out, "S{}", entry.account);
            if let Some(memo) = &entry.memo {
                let _ = writeln!(out, "E{memo}");
            }
            let _ = writeln!(out, "${}", entry.amount);
            out.push_str("^\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{LedgerBuilder, SequentialGuids, parse_book};

    fn tree_with_balances(balances: &[(&str, &str)]) -> AccountTree {
        let document = LedgerBuilder::new()
            .account("root", "Root Account", "ROOT", None)
            .account("assets", "Assets", "ASSET", Some("root"))
            .account("checking", "Checking", "BANK", Some("assets"))
            .account("card", "Card", "CREDIT", Some("root"))
            .account("income", "Income", "INCOME", Some("root"))
            .account("equity", "Equity", "EQUITY", Some("root"))
            .commodity_account("usd", "Dollars", "BANK", "assets", "ISO4217", "USD")
            .commodity_account("shares", "Shares", "STOCK", "assets", "NASDAQ", "ACME")
            .document();
        let mut tree =
            AccountTree::from_book(parse_book(&document), &Namespaces::gnucash()).unwrap();
        for (id, amount) in balances {
            tree.accumulate(id, &amount.parse().unwrap()).unwrap();
        }
        tree
    }

    #[test]
    fn transaction_restates_balances() {
        let tree = tree_with_balances(&[("checking", "123/10"), ("income", "-123/10")]);
        let transaction = opening_transaction(
            &tree,
            &Namespaces::gnucash(),
            2020,
            "+0100",
            &mut SequentialGuids::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(transaction.accounts, 2);
        insta::assert_snapshot!(transaction.element.to_xml().unwrap(), @r#"
        <gnc:transaction version="2.0.0">
        <trn:id type="guid">00000000000000000000000000000003</trn:id>
        <trn:currency>
        <cmdty:space>ISO4217</cmdty:space>
        <cmdty:id>EUR</cmdty:id>
        </trn:currency>
        <trn:date-posted>
        <ts:date>2019-12-31 23:59:59 +0100</ts:date>
        </trn:date-posted>
        <trn:date-entered>
        <ts:date>2019-12-31 23:59:59 +0100</ts:date>
        </trn:date-entered>
        <trn:description>Balance as of 31 December 2019</trn:description>
        <trn:splits>
        <trn:split>
        <split:id type="guid">00000000000000000000000000000001</split:id>
        <split:reconciled-state>n</split:reconciled-state>
        <split:value>1230/100</split:value>
        <split:quantity>1230/100</split:quantity>
        <split:account type="guid">checking</split:account>
        </trn:split>
        <trn:split>
        <split:id type="guid">00000000000000000000000000000002</split:id>
        <split:reconciled-state>n</split:reconciled-state>
        <split:value>-1230/100</split:value>
        <split:quantity>-1230/100</split:quantity>
        <split:account type="guid">income</split:account>
        </trn:split>
        </trn:splits>
        </gnc:transaction>
        "#);
    }

    #[test]
    fn transaction_skips_zero_balances() {
        let tree = tree_with_balances(&[
            ("checking", "1/1"),
            ("checking", "-1/1"),
            ("card", "-12345/10000"),
            ("equity", "12345/10000"),
        ]);
        let transaction = opening_transaction(
            &tree,
            &Namespaces::gnucash(),
            2020,
            "+0000",
            &mut SequentialGuids::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(transaction.accounts, 2);

        let ns = Namespaces::gnucash();
        let accounts: Vec<_> = transaction
            .element
            .find_all(&ns, "trn:splits/trn:split/split:account")
            .unwrap()
            .into_iter()
            .filter_map(Element::text)
            .collect();
        assert_eq!(accounts, ["card", "equity"]);
        let values: Vec<_> = transaction
            .element
            .find_all(&ns, "trn:splits/trn:split/split:value")
            .unwrap()
            .into_iter()
            .filter_map(Element::text)
            .collect();
        assert_eq!(values, ["-12345/10000", "12345/10000"]);
    }

    #[test]
    fn no_transaction_without_balances() {
        let tree = tree_with_balances(&[("checking", "5/1"), ("checking", "-5/1")]);
        let transaction = opening_transaction(
            &tree,
            &Namespaces::gnucash(),
            2020,
            "+0000",
            &mut SequentialGuids::default(),
        )
        .unwrap();
        assert!(transaction.is_none());
    }

    #[test]
    fn split_values_sum_to_the_balances() {
        let balances = [
            ("checking", "100/3"),
            ("usd", "2501/100"),
            ("card", "-7/8"),
        ];
        let tree = tree_with_balances(&balances);
        let transaction = opening_transaction(
            &tree,
            &Namespaces::gnucash(),
            2020,
            "+0000",
            &mut RandomGuids,
        )
        .unwrap()
        .unwrap();
        let ns = Namespaces::gnucash();
        for split in transaction
            .element
            .find_all(&ns, "trn:splits/trn:split")
            .unwrap()
        {
            let id = split.required_text(&ns, "split:account").unwrap();
            let value: Amount = split
                .required_text(&ns, "split:value")
                .unwrap()
                .parse()
                .unwrap();
            let balance = &tree.get(tree.index_of(id).unwrap()).balance;
            if balance.decimal_places().is_some() {
                assert_eq!(&value, balance);
            } else {
                // 100/3 has no exact decimal form
                assert_eq!(value.to_fraction(), "33333333333/1000000000");
            }
        }
    }

    #[test]
    fn truncated_balances_leave_a_remainder() {
        let tree = tree_with_balances(&[
            ("checking", "1/3"),
            ("usd", "1/3"),
            ("card", "1/3"),
            ("income", "-1/1"),
        ]);
        let transaction = opening_transaction(
            &tree,
            &Namespaces::gnucash(),
            2020,
            "+0000",
            &mut SequentialGuids::default(),
        )
        .unwrap()
        .unwrap();
        let ns = Namespaces::gnucash();
        let values: Vec<Amount> = transaction
            .element
            .find_all(&ns, "trn:splits/trn:split/split:value")
            .unwrap()
            .into_iter()
            .filter_map(Element::text)
            .map(|value| value.parse().unwrap())
            .collect();
        assert_eq!(values.len(), 4);
        let total: Amount = values.iter().sum();
        assert_eq!(total, Amount::new(-1, 1_000_000_000).unwrap());
    }

    #[test]
    fn statement_memo_from_description() {
        let input = LedgerBuilder::wrap(
            r#"<gnc:account version="2.0.0">
<act:name>Root Account</act:name>
<act:id type="guid">root</act:id>
<act:type>ROOT</act:type>
</gnc:account>
<gnc:account version="2.0.0">
<act:name>Savings</act:name>
<act:id type="guid">savings</act:id>
<act:type>BANK</act:type>
<act:commodity>
<cmdty:space>ISO4217</cmdty:space>
<cmdty:id>EUR</cmdty:id>
</act:commodity>
<act:description>Rainy day &amp; more</act:description>
<act:parent type="guid">root</act:parent>
</gnc:account>
"#,
        );
        let document = crate::document::Document::read(input.as_bytes()).unwrap();
        let mut tree =
            AccountTree::from_book(parse_book(&document), &Namespaces::gnucash()).unwrap();
        tree.accumulate("savings", &"250/1".parse().unwrap()).unwrap();

        let statements = statements(&tree, 2021);
        assert_eq!(statements[0].entries[0].memo.as_deref(), Some("Rainy day & more"));
        insta::assert_snapshot!(statements[0].render(), @r"
        !Account
        NEquity:Opening Balances:EUR
        TOth A
        ^
        !Type:Oth A
        D2021-01-01
        SSavings
        ERainy day & more
        $-250.00
        ^
        ");
    }

    #[test]
    fn random_guids_are_unique() {
        let mut guids = RandomGuids;
        let a = guids.next_guid();
        let b = guids.next_guid();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn statements_per_commodity() {
        let tree = tree_with_balances(&[
            ("checking", "150000/100"),
            ("card", "-2550/100"),
            ("usd", "10/1"),
            ("shares", "3/1"),
            ("income", "-147450/100"),
            ("equity", "0/1"),
        ]);
        let statements = statements(&tree, 2020);
        let summary: Vec<_> = statements
            .iter()
            .map(|statement| (statement.file_name(), statement.entries.len()))
            .collect();
        assert_eq!(
            summary,
            [
                ("2020ACME.qif".to_string(), 1),
                ("2020EUR.qif".to_string(), 2),
                ("2020USD.qif".to_string(), 1),
            ]
        );

        insta::assert_snapshot!(statements[1].render(), @r"
        !Account
        NEquity:Opening Balances:EUR
        TOth A
        ^
        !Type:Oth A
        D2020-01-01
        SAssets:Checking
        $-1500.00
        ^
        SCard
        $25.50
        ^
        ");
    }

    #[test]
    fn statements_leave_out_income_expense_and_equity() {
        let tree = tree_with_balances(&[("income", "-5/1"), ("equity", "5/1")]);
        assert!(statements(&tree, 2020).is_empty());
    }
}
