use strum_macros::Display;

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Signal {
    Gain,
    Loss,
    Neutral,
    Unknown,
}
