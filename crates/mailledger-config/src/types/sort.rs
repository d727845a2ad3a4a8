//! Sort order type.
//!
//! A sort value packs a [`SortKey`] into the low byte and two independent
//! modifier bits above it:
//!
//! ```text
//!  15        10   9      8       7            0
//! ┌───────────┬──────┬─────────┬──────────────┐
//! │  unused   │ LAST │ REVERSE │   sort key   │
//! └───────────┴──────┴─────────┴──────────────┘
//! ```
//!
//! Which keys are legal, and what they are called, depends on the context
//! the variable sorts (message index, alias menu, file browser, ...). The
//! context is chosen by the variable's subtype bits.

use crate::definition::{NativeValue, VarType, VariableDef};
use crate::error::{Error, Result};

use super::{DataType, TypeHandler};

/// Base key of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SortKey {
    /// Date sent.
    Date = 1,
    /// Message or file size.
    Size = 2,
    /// Subject (alphabetical in the browser).
    Subject = 3,
    /// Sender.
    From = 4,
    /// Natural mailbox order (unsorted).
    Order = 5,
    /// Threads.
    Threads = 6,
    /// Date received.
    Received = 7,
    /// Recipient.
    To = 8,
    /// Score.
    Score = 9,
    /// Alias name.
    Alias = 10,
    /// Address.
    Address = 11,
    /// Key id.
    KeyId = 12,
    /// Key trust.
    Trust = 13,
    /// Spam attribute.
    Spam = 14,
    /// Message count.
    Count = 15,
    /// Unread count.
    Unread = 16,
    /// Flagged count.
    Flagged = 17,
    /// Mailbox path.
    Path = 18,
    /// Label.
    Label = 19,
    /// Description.
    Desc = 20,
}

impl SortKey {
    /// Alphabetical order shares its code with [`SortKey::Subject`].
    pub const ALPHA: Self = Self::Subject;

    /// Looks up a key by its numeric code.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => Self::Date,
            2 => Self::Size,
            3 => Self::Subject,
            4 => Self::From,
            5 => Self::Order,
            6 => Self::Threads,
            7 => Self::Received,
            8 => Self::To,
            9 => Self::Score,
            10 => Self::Alias,
            11 => Self::Address,
            12 => Self::KeyId,
            13 => Self::Trust,
            14 => Self::Spam,
            15 => Self::Count,
            16 => Self::Unread,
            17 => Self::Flagged,
            18 => Self::Path,
            19 => Self::Label,
            20 => Self::Desc,
            _ => return None,
        })
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// A sort key with its `reverse` and `last` modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u16", try_from = "u16"))]
pub struct SortOrder(u16);

impl SortOrder {
    /// Bits holding the sort key.
    pub const KEY_MASK: u16 = 0x00ff;
    /// Sort in descending order.
    pub const REVERSE: u16 = 1 << 8;
    /// Sort threads by their last message.
    pub const LAST: u16 = 1 << 9;

    const VALID_BITS: u16 = Self::KEY_MASK | Self::REVERSE | Self::LAST;

    /// Creates an ascending sort on `key`.
    #[must_use]
    pub const fn new(key: SortKey) -> Self {
        Self(key.code())
    }

    /// Returns a copy with the `reverse` modifier set.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self(self.0 | Self::REVERSE)
    }

    /// Returns a copy with the `last` modifier set.
    #[must_use]
    pub const fn with_last(self) -> Self {
        Self(self.0 | Self::LAST)
    }

    /// Returns the sort key, if the key bits name one.
    #[must_use]
    pub const fn key(self) -> Option<SortKey> {
        SortKey::from_code(self.key_bits())
    }

    /// Returns the raw key bits.
    #[must_use]
    pub const fn key_bits(self) -> u16 {
        self.0 & Self::KEY_MASK
    }

    /// Returns true if the `reverse` modifier is set.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        self.0 & Self::REVERSE != 0
    }

    /// Returns true if the `last` modifier is set.
    #[must_use]
    pub const fn is_last(self) -> bool {
        self.0 & Self::LAST != 0
    }

    /// Returns the packed representation.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Unpacks a value, rejecting unknown keys and stray bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits & !Self::VALID_BITS != 0 || SortKey::from_code(bits & Self::KEY_MASK).is_none() {
            return None;
        }
        Some(Self(bits))
    }

    /// Returns the native value stored in a variable.
    #[must_use]
    pub fn to_native(self) -> NativeValue {
        NativeValue::from(self.0)
    }

    /// Interprets a variable's native value.
    #[must_use]
    pub fn from_native(value: NativeValue) -> Option<Self> {
        u16::try_from(value).ok().and_then(Self::from_bits)
    }
}

impl From<SortKey> for SortOrder {
    fn from(key: SortKey) -> Self {
        Self::new(key)
    }
}

impl From<SortOrder> for u16 {
    fn from(order: SortOrder) -> Self {
        order.0
    }
}

impl TryFrom<u16> for SortOrder {
    type Error = String;

    fn try_from(bits: u16) -> std::result::Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or_else(|| format!("invalid sort order {bits:#06x}"))
    }
}

/// What a sort variable sorts; selects the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortContext {
    /// Message index (`sort`).
    Index,
    /// Alias menu (`sort_alias`).
    Alias,
    /// File browser (`sort_browser`).
    Browser,
    /// Key selection menu (`pgp_sort_keys`).
    Keys,
    /// Secondary message sort within threads (`sort_aux`).
    Aux,
    /// Sidebar (`sidebar_sort_method`).
    Sidebar,
}

use SortKey as K;

const INDEX_METHODS: &[(&str, SortKey)] = &[
    ("date", K::Date),
    ("date-sent", K::Date),
    ("date-received", K::Received),
    ("from", K::From),
    ("label", K::Label),
    ("unsorted", K::Order),
    ("mailbox-order", K::Order),
    ("score", K::Score),
    ("size", K::Size),
    ("spam", K::Spam),
    ("subject", K::Subject),
    ("threads", K::Threads),
    ("to", K::To),
];

// Threads within threads make no sense, so `threads` means date here.
const AUX_METHODS: &[(&str, SortKey)] = &[
    ("date", K::Date),
    ("date-sent", K::Date),
    ("threads", K::Date),
    ("date-received", K::Received),
    ("from", K::From),
    ("label", K::Label),
    ("unsorted", K::Order),
    ("mailbox-order", K::Order),
    ("score", K::Score),
    ("size", K::Size),
    ("spam", K::Spam),
    ("subject", K::Subject),
    ("to", K::To),
];

const BROWSER_METHODS: &[(&str, SortKey)] = &[
    ("alpha", K::ALPHA),
    ("count", K::Count),
    ("date", K::Date),
    ("desc", K::Desc),
    ("new", K::Unread),
    ("unread", K::Unread),
    ("size", K::Size),
    ("unsorted", K::Order),
];

const ALIAS_METHODS: &[(&str, SortKey)] = &[
    ("alias", K::Alias),
    ("address", K::Address),
    ("unsorted", K::Order),
];

const KEY_METHODS: &[(&str, SortKey)] = &[
    ("address", K::Address),
    ("date", K::Date),
    ("keyid", K::KeyId),
    ("trust", K::Trust),
];

const SIDEBAR_METHODS: &[(&str, SortKey)] = &[
    ("alpha", K::Path),
    ("count", K::Count),
    ("desc", K::Desc),
    ("flagged", K::Flagged),
    ("mailbox-order", K::Order),
    ("name", K::Path),
    ("new", K::Unread),
    ("path", K::Path),
    ("unread", K::Unread),
    ("unsorted", K::Order),
];

impl SortContext {
    /// Subtype bits for the alias menu.
    pub const ALIAS_FLAG: u16 = 0x040;
    /// Subtype bits for the file browser.
    pub const BROWSER_FLAG: u16 = 0x080;
    /// Subtype bits for key selection.
    pub const KEYS_FLAG: u16 = 0x100;
    /// Subtype bits for the auxiliary sort.
    pub const AUX_FLAG: u16 = 0x200;
    /// Subtype bits for the sidebar.
    pub const SIDEBAR_FLAG: u16 = 0x400;

    /// All contexts.
    pub const ALL: [Self; 6] = [
        Self::Index,
        Self::Alias,
        Self::Browser,
        Self::Keys,
        Self::Aux,
        Self::Sidebar,
    ];

    /// Selects a context from a variable's subtype bits.
    ///
    /// No bits means the message index; combinations are invalid.
    #[must_use]
    pub const fn from_subtype(subtype: u16) -> Option<Self> {
        match subtype {
            0 => Some(Self::Index),
            Self::ALIAS_FLAG => Some(Self::Alias),
            Self::BROWSER_FLAG => Some(Self::Browser),
            Self::KEYS_FLAG => Some(Self::Keys),
            Self::AUX_FLAG => Some(Self::Aux),
            Self::SIDEBAR_FLAG => Some(Self::Sidebar),
            _ => None,
        }
    }

    /// Returns the subtype bits selecting this context.
    #[must_use]
    pub const fn subtype(self) -> u16 {
        match self {
            Self::Index => 0,
            Self::Alias => Self::ALIAS_FLAG,
            Self::Browser => Self::BROWSER_FLAG,
            Self::Keys => Self::KEYS_FLAG,
            Self::Aux => Self::AUX_FLAG,
            Self::Sidebar => Self::SIDEBAR_FLAG,
        }
    }

    /// Returns the variable type for a sort variable in this context.
    #[must_use]
    pub const fn var_type(self) -> VarType {
        VarType::new(DataType::SORT, self.subtype())
    }

    /// Returns the `(name, key)` table for this context.
    #[must_use]
    pub const fn methods(self) -> &'static [(&'static str, SortKey)] {
        match self {
            Self::Index => INDEX_METHODS,
            Self::Alias => ALIAS_METHODS,
            Self::Browser => BROWSER_METHODS,
            Self::Keys => KEY_METHODS,
            Self::Aux => AUX_METHODS,
            Self::Sidebar => SIDEBAR_METHODS,
        }
    }

    /// Returns true if `last` may be combined with keys in this context.
    #[must_use]
    pub const fn allows_last(self) -> bool {
        matches!(self, Self::Index | Self::Aux)
    }

    /// Looks up a method name (case-sensitive).
    #[must_use]
    pub fn lookup(self, name: &str) -> Option<SortKey> {
        self.methods()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, key)| key)
    }

    /// Returns the canonical name of a key: the first table entry for it.
    #[must_use]
    pub fn canonical_name(self, key: SortKey) -> Option<&'static str> {
        self.methods()
            .iter()
            .find(|&&(_, k)| k == key)
            .map(|&(name, _)| name)
    }

    /// Returns true if `order` is legal in this context.
    #[must_use]
    pub fn accepts(self, order: SortOrder) -> bool {
        let key_known = order
            .key()
            .is_some_and(|key| self.canonical_name(key).is_some());
        key_known && (!order.is_last() || self.allows_last())
    }

    /// Parses `[reverse-][last-]<method>`.
    ///
    /// The modifiers may also trail the method (`date-reverse`); each may
    /// appear once.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the text is not a legal
    /// sort order for this context.
    pub fn parse(self, text: &str) -> std::result::Result<SortOrder, String> {
        let tokens: Vec<&str> = text.split('-').collect();
        let (mut start, mut end) = (0, tokens.len());
        let (mut reverse, mut last) = (false, false);

        // Leading modifiers, then trailing ones; the method itself is never consumed.
        while end - start > 1 {
            match tokens[start] {
                "reverse" if !reverse => reverse = true,
                "last" if !last => last = true,
                _ => break,
            }
            start += 1;
        }
        while end - start > 1 {
            match tokens[end - 1] {
                "reverse" if !reverse => reverse = true,
                "last" if !last => last = true,
                _ => break,
            }
            end -= 1;
        }

        let method = tokens[start..end].join("-");
        let key = self
            .lookup(&method)
            .ok_or_else(|| format!("unknown sort method '{method}'"))?;
        if last && !self.allows_last() {
            return Err(format!("'last' cannot be used with {self:?} sorting"));
        }

        let mut order = SortOrder::new(key);
        if reverse {
            order = order.reversed();
        }
        if last {
            order = order.with_last();
        }
        Ok(order)
    }

    /// Renders an order as `[reverse-][last-]<canonical method>`.
    ///
    /// Returns `None` if the order is not legal in this context.
    #[must_use]
    pub fn render(self, order: SortOrder) -> Option<String> {
        if !self.accepts(order) {
            return None;
        }
        let name = self.canonical_name(order.key()?)?;

        let mut out = String::new();
        if order.is_reverse() {
            out.push_str("reverse-");
        }
        if order.is_last() {
            out.push_str("last-");
        }
        out.push_str(name);
        Some(out)
    }
}

/// Handler for [`DataType::SORT`] variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortType;

impl SortType {
    fn context(def: &VariableDef) -> Result<SortContext> {
        let subtype = def.var_type().subtype;
        SortContext::from_subtype(subtype).ok_or_else(|| Error::InvalidSubtype {
            name: def.name().to_string(),
            subtype,
        })
    }
}

impl TypeHandler for SortType {
    fn data_type(&self) -> DataType {
        DataType::SORT
    }

    fn name(&self) -> &'static str {
        "sort"
    }

    fn parse(&self, def: &VariableDef, text: &str) -> Result<NativeValue> {
        let context = Self::context(def)?;
        context
            .parse(text)
            .map(SortOrder::to_native)
            .map_err(|reason| Error::invalid_value(def.name(), text, reason))
    }

    fn render(&self, def: &VariableDef, value: NativeValue) -> Result<String> {
        let context = Self::context(def)?;
        SortOrder::from_native(value)
            .and_then(|order| context.render(order))
            .ok_or_else(|| Error::out_of_domain(def.name(), value))
    }

    fn validate(&self, def: &VariableDef, value: NativeValue) -> Result<()> {
        let context = Self::context(def)?;
        match SortOrder::from_native(value) {
            Some(order) if context.accepts(order) => Ok(()),
            _ => Err(Error::out_of_domain(def.name(), value)),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::unreadable_literal
)]
mod tests {
    use super::*;
    use crate::definition::Storage;
    use proptest::prelude::*;

    fn def(context: SortContext) -> VariableDef {
        VariableDef::new("sort", context.var_type(), &Storage::new())
    }

    mod order_tests {
        use super::*;

        #[test]
        fn bit_layout() {
            let order = SortOrder::new(SortKey::Score).reversed();
            assert_eq!(order.bits(), 9 | 0x100);
            assert_eq!(order.key(), Some(SortKey::Score));
            assert!(order.is_reverse());
            assert!(!order.is_last());

            let order = SortOrder::new(SortKey::Date).with_last();
            assert_eq!(order.to_native(), 1 | 0x200);
        }

        #[test]
        fn from_native_rejects_junk() {
            assert_eq!(SortOrder::from_native(-1), None);
            assert_eq!(SortOrder::from_native(999), None);
            assert_eq!(SortOrder::from_native(0), None);
            assert_eq!(SortOrder::from_native(0x400 | 1), None);
            assert_eq!(SortOrder::from_native(i64::from(u16::MAX) + 2), None);
            assert_eq!(
                SortOrder::from_native(6),
                Some(SortOrder::new(SortKey::Threads))
            );
        }

        #[test]
        fn alpha_is_subject() {
            assert_eq!(SortKey::ALPHA, SortKey::Subject);
            assert_eq!(SortKey::from_code(3), Some(SortKey::Subject));
        }
    }

    mod context_tests {
        use super::*;

        #[test]
        fn subtype_roundtrip() {
            for context in SortContext::ALL {
                assert_eq!(SortContext::from_subtype(context.subtype()), Some(context));
            }
            let combined = SortContext::AUX_FLAG | SortContext::ALIAS_FLAG;
            assert_eq!(SortContext::from_subtype(combined), None);
        }

        #[test]
        fn canonical_names() {
            assert_eq!(
                SortContext::Index.canonical_name(SortKey::Date),
                Some("date")
            );
            assert_eq!(
                SortContext::Index.canonical_name(SortKey::Order),
                Some("unsorted")
            );
            assert_eq!(
                SortContext::Sidebar.canonical_name(SortKey::Path),
                Some("alpha")
            );
            assert_eq!(SortContext::Alias.canonical_name(SortKey::Date), None);
        }

        #[test]
        fn parse_modifiers() {
            let ctx = SortContext::Index;
            assert_eq!(
                ctx.parse("reverse-score"),
                Ok(SortOrder::new(SortKey::Score).reversed())
            );
            assert_eq!(
                ctx.parse("last-date-sent"),
                Ok(SortOrder::new(SortKey::Date).with_last())
            );
            assert_eq!(
                ctx.parse("reverse-last-date-received"),
                Ok(SortOrder::new(SortKey::Received).reversed().with_last())
            );
            assert_eq!(
                ctx.parse("last-reverse-size"),
                Ok(SortOrder::new(SortKey::Size).reversed().with_last())
            );
            assert_eq!(
                ctx.parse("date-reverse"),
                Ok(SortOrder::new(SortKey::Date).reversed())
            );
        }

        #[test]
        fn parse_rejects() {
            let ctx = SortContext::Index;
            for bad in [
                "", "junk", "-1", "999", "reverse", "last", "reverse-reverse-date", "Date",
                "date-", "reverse-junk",
            ] {
                assert!(ctx.parse(bad).is_err(), "{bad:?} should not parse");
            }
        }

        #[test]
        fn last_only_where_allowed() {
            assert!(SortContext::Aux.parse("last-date").is_ok());
            assert!(SortContext::Alias.parse("last-alias").is_err());
            assert!(SortContext::Browser.parse("last-date").is_err());
            assert!(!SortContext::Sidebar.accepts(SortOrder::new(SortKey::Count).with_last()));
        }

        #[test]
        fn aux_threads_means_date() {
            assert_eq!(
                SortContext::Aux.parse("threads"),
                Ok(SortOrder::new(SortKey::Date))
            );
            assert_eq!(
                SortContext::Aux.render(SortOrder::new(SortKey::Threads)),
                None
            );
        }

        #[test]
        fn render_fixed_token_order() {
            let order = SortContext::Index.parse("date-sent-reverse").unwrap();
            assert_eq!(
                SortContext::Index.render(order).as_deref(),
                Some("reverse-date")
            );
        }
    }

    mod handler_tests {
        use super::*;

        #[test]
        fn parse_and_render() {
            let d = def(SortContext::Alias);
            let value = SortType.parse(&d, "reverse-address").unwrap();
            assert_eq!(value, SortOrder::new(SortKey::Address).reversed().to_native());
            assert_eq!(SortType.render(&d, value).unwrap(), "reverse-address");
        }

        #[test]
        fn validate_domain() {
            let d = def(SortContext::Keys);
            assert!(SortType.validate(&d, SortKey::Trust as i64).is_ok());
            assert!(SortType.validate(&d, SortKey::Threads as i64).is_err());
            assert!(SortType.validate(&d, -1).is_err());
            assert!(SortType.validate(&d, 999).is_err());
        }

        #[test]
        fn invalid_subtype_fails_every_call() {
            let storage = Storage::new();
            let ty = VarType::new(
                DataType::SORT,
                SortContext::AUX_FLAG | SortContext::ALIAS_FLAG,
            );
            let d = VariableDef::new("Raspberry", ty, &storage);

            assert!(matches!(
                SortType.parse(&d, "alpha"),
                Err(Error::InvalidSubtype { .. })
            ));
            assert!(matches!(
                SortType.render(&d, 1),
                Err(Error::InvalidSubtype { .. })
            ));
            assert!(matches!(
                SortType.validate(&d, 6),
                Err(Error::InvalidSubtype { .. })
            ));
        }
    }

    fn context_strategy() -> impl Strategy<Value = SortContext> {
        prop::sample::select(SortContext::ALL.to_vec())
    }

    fn text_strategy() -> impl Strategy<Value = (SortContext, String)> {
        context_strategy().prop_flat_map(|ctx| {
            let names: Vec<&'static str> = ctx.methods().iter().map(|&(n, _)| n).collect();
            (
                Just(ctx),
                prop::sample::select(names),
                any::<bool>(),
                any::<bool>(),
            )
                .prop_map(|(ctx, name, reverse, last)| {
                    let last = last && ctx.allows_last();
                    let mut text = String::new();
                    if reverse {
                        text.push_str("reverse-");
                    }
                    if last {
                        text.push_str("last-");
                    }
                    text.push_str(name);
                    (ctx, text)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_render_of_parse_is_same_value((ctx, text) in text_strategy()) {
            let order = ctx.parse(&text).unwrap();
            let rendered = ctx.render(order).unwrap();
            prop_assert_eq!(ctx.parse(&rendered), Ok(order));
        }

        #[test]
        fn prop_parse_of_render_is_identity(ctx in context_strategy(), bits in 0u16..0x400) {
            if let Some(order) = SortOrder::from_bits(bits).filter(|o| ctx.accepts(*o)) {
                let rendered = ctx.render(order).unwrap();
                prop_assert_eq!(ctx.parse(&rendered), Ok(order));
            } else {
                prop_assert!(ctx.render(SortOrder(bits)).is_none());
            }
        }
    }
}
