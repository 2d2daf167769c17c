use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub type Sections = HashMap<String, HashMap<String, String>>;

pub fn deserialize_sections(path: &Path) -> Result<Sections> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let sections: Sections = serde_ini::from_bufread(reader)?;

    Ok(sections)
}

/// Writes every section as `[name]` followed by `key = value` lines, both sorted,
/// so rewrites of an unchanged config produce an identical file.
pub fn serialize_write_ordered(sections: &Sections, path: &Path) -> Result<()> {
    let file = create_private(path)?;
    let mut writer = BufWriter::new(file);

    let sorted_sections: BTreeMap<_, _> = sections.iter().collect();

    for (name, section) in sorted_sections {
        writeln!(writer, "[{}]", name)?;
        let sorted_keys: BTreeMap<_, _> = section.iter().collect();
        for (key, value) in sorted_keys {
            writeln!(writer, "{} = {}", key, value)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;

    info!("ia config file written to {}", path.display());

    Ok(())
}

#[cfg(unix)]
fn create_private(path: &Path) -> Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies to newly created files
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;

    Ok(file)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(entries: &[(&str, &str, &str)]) -> Sections {
        let mut sections = Sections::new();
        for (section, key, value) in entries {
            sections
                .entry(section.to_string())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }
        sections
    }

    #[test]
    fn writes_sorted_sections_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ia.ini");
        let input = sections(&[
            ("s3", "secret", "shh"),
            ("s3", "access", "key"),
            ("cookies", "logged-in-user", "alice"),
        ]);

        serialize_write_ordered(&input, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "[cookies]\nlogged-in-user = alice\n\n[s3]\naccess = key\nsecret = shh\n\n"
        );
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ia.ini");
        let input = sections(&[
            ("s3", "access", "key"),
            ("cookies", "logged-in-sig", "abc; path=/; domain=.archive.org"),
        ]);

        serialize_write_ordered(&input, &path).unwrap();

        assert_eq!(deserialize_sections(&path).unwrap(), input);
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ia.ini");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        serialize_write_ordered(&Sections::new(), &path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
