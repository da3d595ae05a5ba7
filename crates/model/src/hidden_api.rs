use std::collections::BTreeSet;

/// Platform classification restricting the use of a member by applications.
///
/// Declaration order is the order categories are reported in: the API list
/// first, then domain flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HiddenApiRestriction {
    Whitelist,
    Greylist,
    Blacklist,
    GreylistMaxO,
    GreylistMaxP,
    GreylistMaxQ,
    GreylistMaxR,
    GreylistMaxS,
    CorePlatformApi,
    TestApi,
}

pub type HiddenApiRestrictions = BTreeSet<HiddenApiRestriction>;

const LIST_MASK: u32 = 0x7;
const CORE_PLATFORM_API_FLAG: u32 = 0x8;
const TEST_API_FLAG: u32 = 0x10;

impl HiddenApiRestriction {
    pub fn name(self) -> &'static str {
        match self {
            HiddenApiRestriction::Whitelist => "whitelist",
            HiddenApiRestriction::Greylist => "greylist",
            HiddenApiRestriction::Blacklist => "blacklist",
            HiddenApiRestriction::GreylistMaxO => "greylist-max-o",
            HiddenApiRestriction::GreylistMaxP => "greylist-max-p",
            HiddenApiRestriction::GreylistMaxQ => "greylist-max-q",
            HiddenApiRestriction::GreylistMaxR => "greylist-max-r",
            HiddenApiRestriction::GreylistMaxS => "greylist-max-s",
            HiddenApiRestriction::CorePlatformApi => "core-platform-api",
            HiddenApiRestriction::TestApi => "test-api",
        }
    }

    /// Decodes the per-member flags word of the hidden-API section.
    pub fn from_flags(flags: u32) -> HiddenApiRestrictions {
        let mut restrictions = HiddenApiRestrictions::new();
        let list = match flags & LIST_MASK {
            0 => HiddenApiRestriction::Whitelist,
            1 => HiddenApiRestriction::Greylist,
            2 => HiddenApiRestriction::Blacklist,
            3 => HiddenApiRestriction::GreylistMaxO,
            4 => HiddenApiRestriction::GreylistMaxP,
            5 => HiddenApiRestriction::GreylistMaxQ,
            6 => HiddenApiRestriction::GreylistMaxR,
            _ => HiddenApiRestriction::GreylistMaxS,
        };
        restrictions.insert(list);
        if flags & CORE_PLATFORM_API_FLAG != 0 {
            restrictions.insert(HiddenApiRestriction::CorePlatformApi);
        }
        if flags & TEST_API_FLAG != 0 {
            restrictions.insert(HiddenApiRestriction::TestApi);
        }
        restrictions
    }
}

/// A member is restricted when it has categories and none of them is the
/// whitelist.
pub fn is_restricted(restrictions: &HiddenApiRestrictions) -> bool {
    !restrictions.is_empty() && !restrictions.contains(&HiddenApiRestriction::Whitelist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        let flags = HiddenApiRestriction::from_flags(0x2 | 0x10);
        let names: Vec<_> = flags.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["blacklist", "test-api"]);
        assert!(is_restricted(&flags));
    }

    #[test]
    fn test_whitelist_is_not_restricted() {
        let flags = HiddenApiRestriction::from_flags(0x8);
        assert!(flags.contains(&HiddenApiRestriction::Whitelist));
        assert!(flags.contains(&HiddenApiRestriction::CorePlatformApi));
        assert!(!is_restricted(&flags));
        assert!(!is_restricted(&HiddenApiRestrictions::new()));
    }
}
