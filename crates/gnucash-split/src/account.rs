//! The account hierarchy of one book.

use std::collections::HashMap;

use crate::amount::Amount;
use crate::document::Element;
use crate::namespaces::Namespaces;
use crate::{Result, SplitError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    Root,
    Asset,
    Liability,
    Income,
    Expense,
    Equity,
    /// Bank, cash, stock, payable, ... all behave like any other account here.
    Other(String),
}

impl AccountKind {
    /// Income, expense and equity accounts carry no opening balance in a
    /// statement; the root never does.
    pub fn is_balance_sheet(&self) -> bool {
        !matches!(
            self,
            AccountKind::Root | AccountKind::Income | AccountKind::Expense | AccountKind::Equity
        )
    }
}

impl From<&str> for AccountKind {
    fn from(s: &str) -> Self {
        match s {
            "ROOT" => AccountKind::Root,
            "ASSET" => AccountKind::Asset,
            "LIABILITY" => AccountKind::Liability,
            "INCOME" => AccountKind::Income,
            "EXPENSE" => AccountKind::Expense,
            "EQUITY" => AccountKind::Equity,
            other => AccountKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Commodity {
    pub space: Option<String>,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    pub description: Option<String>,
    pub commodity: Option<Commodity>,
    /// Index of the parent in the owning [`AccountTree`]; `None` for the root.
    pub parent: Option<usize>,
    pub balance: Amount,
}

/// Accounts in document order, addressable by identifier.
#[derive(Debug, Default)]
pub struct AccountTree {
    accounts: Vec<Account>,
    by_id: HashMap<String, usize>,
}

impl AccountTree {
    /// Read every `gnc:account` directly below `book`.
    pub fn from_book(book: &Element, ns: &Namespaces) -> Result<Self> {
        let mut accounts = Vec::new();
        let mut parents = Vec::new();
        for element in book.find_all(ns, "gnc:account")? {
            let (account, parent) = parse_account(element, ns)?;
            accounts.push(account);
            parents.push(parent);
        }
        Self::link(accounts, parents)
    }

    fn link(mut accounts: Vec<Account>, parents: Vec<Option<String>>) -> Result<Self> {
        let by_id: HashMap<String, usize> = accounts
            .iter()
            .enumerate()
            .map(|(index, account)| (account.id.clone(), index))
            .collect();
        for (account, parent) in accounts.iter_mut().zip(parents) {
            if let Some(parent) = parent {
                let index = by_id.get(&parent).copied().ok_or_else(|| {
                    SplitError::MissingAccount(format!(
                        "parent {parent} of account {}",
                        account.id
                    ))
                })?;
                account.parent = Some(index);
            }
        }
        Ok(AccountTree { accounts, by_id })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, index: usize) -> &Account {
        &self.accounts[index]
    }

    pub fn index_of(&self, id: &str) -> Result<usize> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| SplitError::MissingAccount(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Account)> {
        self.accounts.iter().enumerate()
    }

    /// Add `amount` to the running balance of the account with identifier `id`.
    pub fn accumulate(&mut self, id: &str, amount: &Amount) -> Result<()> {
        let index = self.index_of(id)?;
        self.accounts[index].balance += amount;
        Ok(())
    }

    /// Accounts that ended up with a non-zero balance, in document order.
    pub fn with_balance(&self) -> impl Iterator<Item = (usize, &Account)> {
        self.iter().filter(|(_, account)| !account.balance.is_zero())
    }
}

fn parse_account(element: &Element, ns: &Namespaces) -> Result<(Account, Option<String>)> {
    let id = element.required_text(ns, "act:id")?.to_string();
    let name = element.required_text(ns, "act:name")?.to_string();
    let kind = AccountKind::from(element.required_text(ns, "act:type")?);
    let description = element
        .optional_text(ns, "act:description")?
        .map(str::to_string);

    let (parent, commodity) = if kind == AccountKind::Root {
        (None, None)
    } else {
        let parent = element.required_text(ns, "act:parent")?.to_string();
        let commodity = Commodity {
            space: element
                .optional_text(ns, "act:commodity/cmdty:space")?
                .map(str::to_string),
            id: element
                .required_text(ns, "act:commodity/cmdty:id")?
                .to_string(),
        };
        (Some(parent), Some(commodity))
    };

    let account = Account {
        id,
        name,
        kind,
        description,
        commodity,
        parent: None,
        balance: Amount::zero(),
    };
    Ok((account, parent))
}

/// Memoized colon-joined names (`Assets:Current:Checking`), kept beside the
/// tree rather than inside it.
#[derive(Debug, Default)]
pub struct FullNames {
    names: HashMap<usize, String>,
}

impl FullNames {
    pub fn new() -> Self {
        FullNames::default()
    }

    /// Walk up from `index` until the root or an already named ancestor, then
    /// name every account passed on the way back down.
    pub fn resolve(&mut self, tree: &AccountTree, index: usize) -> &str {
        let mut chain = Vec::new();
        let mut cursor = index;
        let mut prefix: Option<String> = loop {
            if let Some(name) = self.names.get(&cursor) {
                // the root is memoized as "" but never used as a prefix
                break (tree.get(cursor).parent.is_some()).then(|| name.clone());
            }
            match tree.get(cursor).parent {
                Some(parent) => {
                    chain.push(cursor);
                    cursor = parent;
                }
                None => {
                    self.names.insert(cursor, String::new());
                    break None;
                }
            }
        };

        for &account in chain.iter().rev() {
            let own = &tree.get(account).name;
            let full = match prefix {
                Some(prefix) => format!("{prefix}:{own}"),
                None => own.clone(),
            };
            self.names.insert(account, full.clone());
            prefix = Some(full);
        }

        &self.names[&index]
    }
}
