//! Building the environment for a child process.
//!
//! The child gets the host environment minus every variable a requested
//! record exposes, followed by the exposed variables themselves.  A key
//! never appears twice, and a vault value always beats a host value.
//! Host entries are kept as raw OS strings, so values that are not
//! valid UTF-8 reach the child byte for byte.

use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};

use crate::vault::VaultIndex;

/// One environment variable, as handed to `Command::envs`.
pub type EnvVar = (OsString, OsString);

/// Result of composing an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    /// Final entries, host entries first.
    pub env: Vec<EnvVar>,

    /// Requested record names that were not in the vault, in request order.
    pub missing: Vec<String>,
}

/// Compose the child environment from `host`, the `requested` record
/// names, and the decrypted `vault`.
///
/// Unknown names are collected in `missing` and otherwise ignored.
/// When two requested records expose the same variable, the first
/// position is kept and the later record's value is used.
pub fn compose<S: AsRef<str>>(host: &[EnvVar], requested: &[S], vault: &VaultIndex) -> Composition {
    let mut missing = Vec::new();
    let mut injected: Vec<(&str, &str)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for name in requested {
        let name = name.as_ref();
        let Some(record) = vault.get(name) else {
            missing.push(name.to_string());
            continue;
        };

        for (key, value) in &record.variables {
            let existing = positions.get(key.as_str()).copied();
            match existing {
                Some(idx) => injected[idx].1 = value.as_str(),
                None => {
                    positions.insert(key.as_str(), injected.len());
                    injected.push((key.as_str(), value.as_str()));
                }
            }
        }
    }

    let overridden: HashSet<&OsStr> = positions.keys().map(OsStr::new).collect();

    let env = host
        .iter()
        .filter(|(key, _)| !overridden.contains(key.as_os_str()))
        .cloned()
        .chain(
            injected
                .iter()
                .map(|(key, value)| (OsString::from(key), OsString::from(value))),
        )
        .collect();

    Composition { env, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::SecretRecord;
    use std::collections::BTreeMap;

    fn vault(records: &[SecretRecord]) -> VaultIndex {
        records
            .iter()
            .map(|r| (r.name.clone(), r.clone()))
            .collect()
    }

    fn host(entries: &[&str]) -> Vec<EnvVar> {
        entries
            .iter()
            .map(|e| {
                let (k, v) = e.split_once('=').unwrap();
                (k.into(), v.into())
            })
            .collect()
    }

    fn render(out: &Composition) -> Vec<String> {
        out.env
            .iter()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect()
    }

    #[test]
    fn injected_value_replaces_host_value() {
        let vault = vault(&[SecretRecord::single("foo", "FOO", "new")]);
        let out = compose(&host(&["PATH=/bin", "FOO=old"]), &["foo"], &vault);

        assert_eq!(render(&out), vec!["PATH=/bin", "FOO=new"]);
        assert!(out.missing.is_empty());
    }

    #[test]
    fn missing_names_are_reported_and_skipped() {
        let vault = vault(&[SecretRecord::single("api", "API_KEY", "secret123")]);
        let out = compose(&host(&["HOME=/h"]), &["nope", "api", "gone"], &vault);

        assert_eq!(render(&out), vec!["HOME=/h", "API_KEY=secret123"]);
        assert_eq!(out.missing, vec!["nope", "gone"]);
    }

    #[test]
    fn multi_variable_record_injects_all_keys() {
        let mut vars = BTreeMap::new();
        vars.insert("DB_HOST".to_string(), "db".to_string());
        vars.insert("DB_PASS".to_string(), "pw".to_string());
        let vault = vault(&[SecretRecord::new("db", vars)]);

        let out = compose(&host(&["DB_PASS=stale", "TERM=xterm"]), &["db"], &vault);
        assert_eq!(render(&out), vec!["TERM=xterm", "DB_HOST=db", "DB_PASS=pw"]);
    }

    #[test]
    fn overlapping_records_never_duplicate_a_key() {
        let vault = vault(&[
            SecretRecord::single("a", "TOKEN", "from-a"),
            SecretRecord::single("b", "TOKEN", "from-b"),
        ]);
        let out = compose(&host(&["TOKEN=host"]), &["a", "b", "a"], &vault);

        assert_eq!(render(&out), vec!["TOKEN=from-a"]);
    }

    #[test]
    fn later_record_value_wins_on_overlap() {
        let vault = vault(&[
            SecretRecord::single("a", "TOKEN", "from-a"),
            SecretRecord::single("b", "TOKEN", "from-b"),
        ]);
        let out = compose(&host(&[]), &["a", "b"], &vault);

        assert_eq!(render(&out), vec!["TOKEN=from-b"]);
    }

    #[test]
    fn value_containing_equals_keeps_key_intact() {
        let vault = vault(&[SecretRecord::single("u", "URL", "a=b")]);
        let out = compose(&host(&["URL=x=y", "OTHER=1=2"]), &["u"], &vault);

        assert_eq!(render(&out), vec!["OTHER=1=2", "URL=a=b"]);
    }

    #[test]
    fn no_requests_returns_host_unchanged() {
        let vault = vault(&[SecretRecord::single("api", "API_KEY", "s")]);
        let host = host(&["A=1", "B=2"]);
        let out = compose::<&str>(&host, &[], &vault);
        assert_eq!(out.env, host);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_host_value_passes_through_untouched() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"caf\xE9".to_vec());
        let mut env = host(&["PATH=/bin"]);
        env.push(("RAW".into(), raw.clone()));

        let vault = vault(&[SecretRecord::single("api", "API_KEY", "s")]);
        let out = compose(&env, &["api"], &vault);

        assert_eq!(
            out.env,
            vec![
                ("PATH".into(), "/bin".into()),
                ("RAW".into(), raw),
                ("API_KEY".into(), "s".into()),
            ]
        );
    }
}
