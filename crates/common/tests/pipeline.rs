//! Raw log -> detailed -> flattened -> judgement, through the artifact store

use switchtest_common::{
    flatten, judge, parse_ryu_log, ArtifactStore, Error, JudgementVerdict, Profile, Verdict,
};
use tempfile::TempDir;

const RAW: &str = "\
--- Test start ---
match: 00_ip_src
/flow/match(ip_src=1)/add-->'ok' OK
Reconnecting to switch...
/flow/match(ip_src=2)/add-->'ok' OK
action: 01_output
/flow/act/output-->'bad' ERROR
switch rejected
/flow/act/output(port=2)-->'ok' OK
group: 00_ALL
/group/all-->'unsupported' ERROR
OFPGMFC_BAD_TYPE
meter: 00_drop
Test end
";

fn profile(labels: &[&str]) -> Profile {
    Profile::new("l2switch", labels.iter().map(|l| l.to_string()).collect()).unwrap()
}

#[test]
fn pipeline_verdicts() {
    let detailed = parse_ryu_log(RAW).unwrap();
    assert_eq!(detailed.sub_test_count(), 5);

    let flat = flatten(&detailed);
    let rows: Vec<(&str, Verdict)> = flat.iter().map(|r| (r.label.as_str(), r.verdict)).collect();
    assert_eq!(
        rows,
        vec![
            ("act output", Verdict::Diff),
            ("grp ALL", Verdict::Error),
            ("mat ip_src", Verdict::Ok),
            ("mtr drop", Verdict::Empty),
        ]
    );

    let judgement = judge(&flat, &profile(&["mat ip_src"]));
    assert_eq!(judgement.verdict, JudgementVerdict::Pass);

    let judgement = judge(&flat, &profile(&["mat ip_src", "mtr drop", "asf eth_dst"]));
    assert_eq!(judgement.verdict, JudgementVerdict::Fail);
    assert_eq!(judgement.failures.len(), 1);
    assert_eq!(judgement.failures[0].verdict, Verdict::Empty);
    assert_eq!(judgement.not_found, vec!["asf eth_dst".to_string()]);
}

#[test]
fn pipeline_through_store_is_repeatable() {
    let tmp = TempDir::new().unwrap();
    let artifacts = ArtifactStore::new(tmp.path()).switch("ovs", "ryu");
    artifacts.ensure_dir().unwrap();
    let required = profile(&["mat ip_src", "act output"]);

    let mut verdicts = Vec::new();
    for _ in 0..3 {
        artifacts.write_raw(RAW).unwrap();
        let detailed = parse_ryu_log(&artifacts.read_raw().unwrap()).unwrap();
        artifacts.write_detailed(&detailed).unwrap();
        let flat = flatten(&artifacts.read_detailed().unwrap());
        artifacts.write_flattened(&flat).unwrap();
        verdicts.push(judge(&artifacts.read_flattened().unwrap(), &required));
    }

    assert!(verdicts.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(verdicts[0].verdict, JudgementVerdict::Fail);
    assert_eq!(verdicts[0].failures[0].label, "act output");
}

#[test]
fn malformed_log_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let artifacts = ArtifactStore::new(tmp.path()).switch("ovs", "ryu");
    artifacts.ensure_dir().unwrap();

    let raw = "/flow/orphan-->'ok' OK\nmatch: 00_ip_src\nTest end\n";
    let result = parse_ryu_log(raw).map(|detailed| artifacts.write_detailed(&detailed));

    assert!(matches!(result, Err(Error::MalformedReport { line: 1, .. })));
    assert!(!artifacts.detailed_path().exists());
}
