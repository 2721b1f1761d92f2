//! String-valued enums used in endpoint paths and query strings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $value)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(Error::InvalidArgument(format!(
                        concat!("unknown ", stringify!($name), " '{}'"),
                        s
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// Game mode
    Gamemode {
        Osu => "osu",
        Taiko => "taiko",
        /// Catch the Beat; the API calls it fruits
        Catch => "fruits",
        Mania => "mania",
    }
}

string_enum! {
    /// Which list of a user's scores to page through
    ScoreType {
        Best => "best",
        Firsts => "firsts",
        Recent => "recent",
    }
}

string_enum! {
    /// Ranking table
    RankingType {
        /// Spotlight charts
        Charts => "charts",
        Country => "country",
        Performance => "performance",
        Score => "score",
    }
}

string_enum! {
    /// Beatmap leaderboard scope
    LeaderboardScope {
        Global => "global",
        Country => "country",
        Friend => "friend",
    }
}

string_enum! {
    /// Query key used by the beatmap lookup endpoint
    BeatmapLookupType {
        Id => "id",
        Checksum => "checksum",
        Filename => "filename",
    }
}

string_enum! {
    /// OAuth grant
    GrantType {
        AuthorizationCode => "authorization_code",
        ClientCredentials => "client_credentials",
        RefreshToken => "refresh_token",
    }
}

string_enum! {
    /// Ranking filter
    RankingFilter {
        All => "all",
        Friends => "friends",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamemode_wire_names() {
        assert_eq!(Gamemode::Catch.as_str(), "fruits");
        assert_eq!("mania".parse::<Gamemode>().unwrap(), Gamemode::Mania);
        assert_eq!(
            serde_json::to_string(&Gamemode::Catch).unwrap(),
            "\"fruits\""
        );
        assert_eq!(
            serde_json::from_str::<Gamemode>("\"taiko\"").unwrap(),
            Gamemode::Taiko
        );
    }

    #[test]
    fn test_unknown_value_is_misuse() {
        let err = "catch".parse::<Gamemode>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref m) if m.contains("Gamemode")));
    }

    #[test]
    fn test_all_variants_parse_back() {
        for kind in RankingType::ALL {
            assert_eq!(kind.as_str().parse::<RankingType>().unwrap(), *kind);
        }
        for grant in GrantType::ALL {
            assert_eq!(grant.to_string().parse::<GrantType>().unwrap(), *grant);
        }
    }
}
