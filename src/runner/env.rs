use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

/// Dynamic loader search path variable for this platform.
#[cfg(target_os = "macos")]
pub const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(windows)]
pub const LIBRARY_PATH_VAR: &str = "PATH";
#[cfg(not(any(target_os = "macos", windows)))]
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// Child environment: `base`, then the compat library dir, then overrides.
///
/// The compat dir is prepended to the existing library path rather than
/// replacing it; overrides are applied last, key by key.
pub fn build_environment<I>(
    base: I,
    compat_lib_dir: Option<&Path>,
    overrides: Option<&BTreeMap<String, String>>,
) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: BTreeMap<OsString, OsString> = base.into_iter().collect();

    if let Some(compat) = compat_lib_dir {
        let key = OsString::from(LIBRARY_PATH_VAR);
        let value = match env.get(&key).filter(|existing| !existing.is_empty()) {
            Some(existing) => {
                let mut joined = compat.as_os_str().to_owned();
                joined.push(PATH_LIST_SEPARATOR);
                joined.push(existing);
                joined
            }
            None => compat.as_os_str().to_owned(),
        };
        env.insert(key, value);
    }

    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            env.insert(OsString::from(key), OsString::from(value));
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn lookup<'a>(env: &'a BTreeMap<OsString, OsString>, key: &str) -> Option<&'a OsStr> {
        env.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    fn base(pairs: &[(&str, &str)]) -> Vec<(OsString, OsString)> {
        pairs
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }

    #[test]
    fn compat_dir_is_prepended_to_existing_library_path() {
        let env = build_environment(
            base(&[(LIBRARY_PATH_VAR, "/usr/lib"), ("HOME", "/home/u")]),
            Some(Path::new("/opt/libs")),
            None,
        );
        let expected = format!("/opt/libs{PATH_LIST_SEPARATOR}/usr/lib");
        assert_eq!(lookup(&env, LIBRARY_PATH_VAR), Some(OsStr::new(&expected)));
        assert_eq!(lookup(&env, "HOME"), Some(OsStr::new("/home/u")));
    }

    #[test]
    fn compat_dir_alone_when_library_path_unset_or_empty() {
        for prior in [base(&[]), base(&[(LIBRARY_PATH_VAR, "")])] {
            let env = build_environment(prior, Some(Path::new("/opt/libs")), None);
            assert_eq!(
                lookup(&env, LIBRARY_PATH_VAR),
                Some(OsStr::new("/opt/libs"))
            );
        }
    }

    #[test]
    fn overrides_win_over_inherited_and_compat_values() {
        let overrides = BTreeMap::from([
            (LIBRARY_PATH_VAR.to_string(), "/forced".to_string()),
            ("GMAT_MODE".to_string(), "batch".to_string()),
        ]);
        let env = build_environment(
            base(&[(LIBRARY_PATH_VAR, "/usr/lib")]),
            Some(Path::new("/opt/libs")),
            Some(&overrides),
        );
        assert_eq!(lookup(&env, LIBRARY_PATH_VAR), Some(OsStr::new("/forced")));
        assert_eq!(lookup(&env, "GMAT_MODE"), Some(OsStr::new("batch")));
    }

    #[test]
    fn no_compat_dir_leaves_library_path_untouched() {
        let prior = base(&[("PATH", "/bin"), ("TZ", "UTC")]);
        let env = build_environment(prior.clone(), None, None);
        assert_eq!(env, prior.into_iter().collect::<BTreeMap<_, _>>());
    }
}
