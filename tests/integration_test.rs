#[cfg(test)]
mod tests {
    use fleet_profile::{Cancellable, LoadOptions, Profile, ProfileError};
    use std::collections::HashSet;
    use std::fs::File;
    use std::io::{Cursor, Seek, SeekFrom, Write};
    use tempdir::TempDir;

    const WORKSTATIONS: &str = r#"{
    "uid": "workstations",
    "name": "Workstations",
    "description": "Default desktop policy",
    "etag": "7",
    "settings": {
        "org.gnome.gsettings": [
            {
                "key": "/org/gnome/desktop/screensaver/lock-enabled",
                "value": true,
                "signature": "b"
            }
        ]
    },
    "applies-to": {
        "users": ["alice"],
        "groups": ["staff"]
    }
}"#;

    #[test]
    fn test_profile_file_integration() {
        let temp_dir =
            TempDir::new("profiles").expect("Failed to create temporary directory");
        let profile_path = temp_dir.path().join("workstations.json");

        let mut file =
            File::create(&profile_path).expect("Failed to create profile file");
        file.write_all(WORKSTATIONS.as_bytes())
            .expect("Failed to write profile file");
        drop(file);

        let mut file =
            File::open(&profile_path).expect("Failed to open profile file");
        let cancellable = Cancellable::new();
        let profile = Profile::load_sync(&mut file, Some(&cancellable))
            .expect("Failed to load profile");

        assert_eq!(profile.uid(), "workstations");
        assert_eq!(profile.etag(), Some("7"));
        assert!(profile.applies_to_group("staff"));

        // The file is still ours to use after loading
        file.seek(SeekFrom::Start(0))
            .expect("Profile file was closed by the loader");
        let again = Profile::load_sync(&mut file, None)
            .expect("Failed to reload profile");
        assert_eq!(again.document(), profile.document());
    }

    #[test]
    fn test_pretty_data_written_to_disk_loads_back() {
        let temp_dir =
            TempDir::new("profiles").expect("Failed to create temporary directory");
        let original =
            Profile::load_sync(&mut Cursor::new(WORKSTATIONS), None).unwrap();

        for pretty in [false, true] {
            let path = temp_dir.path().join(format!("out-{}.json", pretty));
            std::fs::write(&path, original.to_data(pretty).unwrap()).unwrap();

            let mut file = File::open(&path).unwrap();
            let reloaded = Profile::load_sync(&mut file, None).unwrap();
            assert_eq!(reloaded, original);
            assert_eq!(reloaded.document(), original.document());
        }
    }

    #[test]
    fn test_newer_revision_replaces_older() {
        let older = Profile::load_sync(
            &mut Cursor::new(r#"{"uid":"x","v":1}"#),
            None,
        )
        .unwrap();
        let newer = Profile::load_sync(
            &mut Cursor::new(r#"{"uid":"x","v":2}"#),
            None,
        )
        .unwrap();

        assert_eq!(older, newer);
        assert_eq!(older.identity(), newer.identity());

        let mut set = HashSet::new();
        set.insert(older);
        set.replace(newer);
        let kept = set.iter().next().unwrap();
        assert_eq!(kept.document()["v"], 2);
    }

    #[tokio::test]
    async fn test_async_file_load() {
        let temp_dir =
            TempDir::new("profiles").expect("Failed to create temporary directory");
        let profile_path = temp_dir.path().join("workstations.json");
        std::fs::write(&profile_path, WORKSTATIONS).unwrap();

        let file = File::open(&profile_path).unwrap();
        let options = LoadOptions::default().with_chunk_size(16);
        let (mut file, result) =
            Profile::load_with_options(file, None, options).await;
        let profile = result.unwrap();
        assert_eq!(profile.name(), Some("Workstations"));

        // handed back open
        file.seek(SeekFrom::Start(0)).unwrap();
    }

    #[test]
    fn test_profiles_are_shareable() {
        let profile =
            Profile::load_sync(&mut Cursor::new(WORKSTATIONS), None).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let profile = profile.clone();
                std::thread::spawn(move || {
                    profile
                        .settings("org.gnome.gsettings")
                        .and_then(|s| s.as_array())
                        .map(|s| s.len())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }

    #[test]
    fn test_errors_are_distinguishable() {
        let cancellable = Cancellable::new();
        cancellable.cancel();

        let cancelled =
            Profile::load_sync(&mut Cursor::new(WORKSTATIONS), Some(&cancellable));
        let malformed = Profile::load_sync(&mut Cursor::new("{\"uid\""), None);
        let missing = Profile::load_sync(&mut Cursor::new("{}"), None);

        assert!(cancelled.unwrap_err().is_cancelled());
        assert!(matches!(malformed, Err(ProfileError::Parse { .. })));
        assert!(matches!(missing, Err(ProfileError::Schema(_))));
    }
}
