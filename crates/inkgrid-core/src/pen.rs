#![forbid(unsafe_code)]

//! Immutable pen attribute bundles.
//!
//! A [`Pen`] carries the graphical attributes applied to printed or erased
//! cells: optional foreground/background colour indices plus a set of boolean
//! style attributes. Pens are immutable values with structural equality; all
//! modification goes through the `with_*` builders, which return new pens.
//!
//! Boolean styles are tri-state: absent, explicitly on, or explicitly off.
//! [`Pen::merge`] layers an overlay pen's attributes over a base pen, so an
//! explicit `bold = false` in the overlay wins over `bold = true` in the base,
//! while an absent attribute lets the base value show through.

use bitflags::bitflags;

bitflags! {
    /// Boolean style attributes a pen may carry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct StyleFlags: u8 {
        /// Bold / increased intensity.
        const BOLD      = 0b0000_0001;
        /// Italic text.
        const ITALIC    = 0b0000_0010;
        /// Underlined text.
        const UNDERLINE = 0b0000_0100;
        /// Reverse video (swap fg/bg).
        const REVERSE   = 0b0000_1000;
        /// Strikethrough text.
        const STRIKE    = 0b0001_0000;
    }
}

/// The closed set of pen attribute keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenAttr {
    /// Foreground colour index.
    Fg,
    /// Background colour index.
    Bg,
    /// Bold style bit.
    Bold,
    /// Italic style bit.
    Italic,
    /// Underline style bit.
    Underline,
    /// Reverse-video style bit.
    Reverse,
    /// Strikethrough style bit.
    Strike,
}

impl PenAttr {
    const STYLES: [(PenAttr, StyleFlags); 5] = [
        (PenAttr::Bold, StyleFlags::BOLD),
        (PenAttr::Italic, StyleFlags::ITALIC),
        (PenAttr::Underline, StyleFlags::UNDERLINE),
        (PenAttr::Reverse, StyleFlags::REVERSE),
        (PenAttr::Strike, StyleFlags::STRIKE),
    ];

    /// The style-flag bit for this attribute, if it is a boolean style.
    fn style_flag(self) -> Option<StyleFlags> {
        Self::STYLES
            .iter()
            .find(|(attr, _)| *attr == self)
            .map(|(_, flag)| *flag)
    }
}

/// A pen attribute value: colour indices are integers, styles are booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValue {
    /// An integer value (colour index).
    Int(i32),
    /// A boolean value (style bit).
    Bool(bool),
}

/// An immutable bundle of rendering attributes.
///
/// # Invariants
///
/// - `on ⊆ set`: a style bit only carries a value when it is marked present.
/// - Equality is structural over the attributes, so two pens built through
///   different call sequences compare equal when they carry the same
///   attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Pen {
    fg: Option<i32>,
    bg: Option<i32>,
    /// Which style bits carry an explicit value.
    set: StyleFlags,
    /// The value of each bit in `set`.
    on: StyleFlags,
}

impl Pen {
    /// The empty pen: no attributes at all.
    pub const EMPTY: Self = Self {
        fg: None,
        bg: None,
        set: StyleFlags::empty(),
        on: StyleFlags::empty(),
    };

    /// Create an empty pen.
    #[inline]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Build a pen from an attribute iteration.
    ///
    /// Later entries for the same key overwrite earlier ones. Entries whose
    /// value type does not match the key (a boolean colour, an integer style)
    /// are ignored.
    pub fn from_attrs<I>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (PenAttr, AttrValue)>,
    {
        attrs
            .into_iter()
            .fold(Self::new(), |pen, (attr, value)| pen.with_attr(attr, value))
    }

    /// Return a copy with the foreground colour set.
    #[inline]
    pub const fn with_fg(mut self, colour: i32) -> Self {
        self.fg = Some(colour);
        self
    }

    /// Return a copy with the background colour set.
    #[inline]
    pub const fn with_bg(mut self, colour: i32) -> Self {
        self.bg = Some(colour);
        self
    }

    /// Return a copy with a style bit explicitly on or off.
    #[inline]
    pub fn with_style(mut self, flag: StyleFlags, enabled: bool) -> Self {
        self.set |= flag;
        self.on.set(flag, enabled);
        self
    }

    /// Return a copy with one attribute set from a key/value pair.
    pub fn with_attr(self, attr: PenAttr, value: AttrValue) -> Self {
        match (attr, value) {
            (PenAttr::Fg, AttrValue::Int(v)) => self.with_fg(v),
            (PenAttr::Bg, AttrValue::Int(v)) => self.with_bg(v),
            (_, AttrValue::Bool(b)) => match attr.style_flag() {
                Some(flag) => self.with_style(flag, b),
                None => self,
            },
            (_, AttrValue::Int(_)) => self,
        }
    }

    /// Foreground colour index, if set.
    #[inline]
    pub const fn fg(&self) -> Option<i32> {
        self.fg
    }

    /// Background colour index, if set.
    #[inline]
    pub const fn bg(&self) -> Option<i32> {
        self.bg
    }

    /// The value of a style bit: `None` when absent.
    #[inline]
    pub fn style(&self, flag: StyleFlags) -> Option<bool> {
        self.set.contains(flag).then(|| self.on.contains(flag))
    }

    /// Check whether the pen carries no attributes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.set.is_empty()
    }

    /// Iterate over the attributes the pen carries, colours first.
    pub fn attrs(&self) -> impl Iterator<Item = (PenAttr, AttrValue)> + '_ {
        let colours = [
            self.fg.map(|v| (PenAttr::Fg, AttrValue::Int(v))),
            self.bg.map(|v| (PenAttr::Bg, AttrValue::Int(v))),
        ];
        let styles = PenAttr::STYLES.into_iter().filter_map(move |(attr, flag)| {
            self.set
                .contains(flag)
                .then(|| (attr, AttrValue::Bool(self.on.contains(flag))))
        });
        colours.into_iter().flatten().chain(styles)
    }

    /// Layer `overlay`'s attributes over `base`'s, producing a new pen.
    ///
    /// Attributes present in the overlay win; attributes absent from the
    /// overlay fall through to the base.
    pub fn merge(base: &Pen, overlay: &Pen) -> Pen {
        Pen {
            fg: overlay.fg.or(base.fg),
            bg: overlay.bg.or(base.bg),
            set: base.set | overlay.set,
            on: (base.on & !overlay.set) | overlay.on,
        }
    }
}
