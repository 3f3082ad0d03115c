//! Full runs over temporary input trees

use claims::{assert_matches, assert_ok};
use log_grouper::{Config, Error, PipelineState, run};
use tempfile::TempDir;

use crate::{file_names, read_output, write_log};

fn dirs() -> (TempDir, TempDir) {
    (TempDir::new().unwrap(), TempDir::new().unwrap())
}

#[test]
fn two_groups_from_one_file() {
    // Arrange
    let (input, output) = dirs();
    write_log(
        input.path(),
        "a.log",
        &["x|1|s|c|u|seed|g1|t1", "y|2|s|c|u|seed|g2|t2"],
    );
    let config = Config::new(input.path(), output.path()).with_workers(2);

    // Act
    let summary = assert_ok!(run(&config));

    // Assert
    assert_eq!(summary.state, PipelineState::Complete);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.groups, 2);
    assert_eq!(summary.files_written, 2);
    assert_eq!(
        file_names(output.path()),
        vec!["group_g1_output.log", "group_g2_output.log"]
    );

    let g1 = read_output(output.path(), "group_g1_output.log");
    assert_eq!(g1.len(), 1);
    assert_eq!(g1[0].id, 1);
    assert_eq!(g1[0].group, "g1");
    assert_eq!(g1[0].timestamp, "t1");
    assert!(g1[0].object.starts_with('w') && g1[0].object.ends_with("_a.logx"));

    let g2 = read_output(output.path(), "group_g2_output.log");
    assert_eq!(g2.len(), 1);
    assert_eq!(g2[0].id, 2);
}

#[test]
fn empty_group_goes_to_the_ungrouped_file() {
    let (input, output) = dirs();
    write_log(input.path(), "a.log", &["x|1|s|c|u|seed||t1"]);

    assert_ok!(run(&Config::new(input.path(), output.path())));

    assert_eq!(file_names(output.path()), vec!["ungrouped_output.log"]);
    let ungrouped = read_output(output.path(), "ungrouped_output.log");
    assert_eq!(ungrouped.len(), 1);
    assert_eq!(ungrouped[0].group, "");
    assert_eq!(ungrouped[0].object, "w1_a.logx");
}

#[test]
fn undecodable_and_blank_lines_are_left_out() {
    let (input, output) = dirs();
    write_log(
        input.path(),
        "a.log",
        &[
            "x|1|s|c|u|seed|g|t1",
            "",
            "   ",
            "x|1|s|c|u",
            "x|one|s|c|u|seed|g|t",
            "x|2|s|c|u|seed|g|t2",
        ],
    );

    let summary = assert_ok!(run(&Config::new(input.path(), output.path()).with_workers(3)));

    assert_eq!(summary.records, 2);
    assert_eq!(summary.dropped_lines, 2);
    assert_eq!(read_output(output.path(), "group_g_output.log").len(), 2);
}

#[test]
fn files_of_the_same_group_are_merged() {
    let (input, output) = dirs();
    write_log(input.path(), "a.log", &["a|1|s|c|u|seed|shared|t"]);
    write_log(input.path(), "sub/b.log", &["b|2|s|c|u|seed|shared|t"]);
    write_log(input.path(), "sub/deeper/c.log", &["c|3|s|c|u|seed|shared|t"]);
    write_log(input.path(), "sub/ignored.txt", &["d|4|s|c|u|seed|shared|t"]);

    let summary = assert_ok!(run(&Config::new(input.path(), output.path()).with_workers(2)));

    assert_eq!(summary.files, 3);
    let mut ids: Vec<i64> = read_output(output.path(), "group_shared_output.log")
        .iter()
        .map(|r| r.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn custom_extension_selects_other_files() {
    let (input, output) = dirs();
    write_log(input.path(), "a.log", &["a|1|s|c|u|seed|g|t"]);
    write_log(input.path(), "b.txt", &["b|2|s|c|u|seed|g|t"]);

    let config = Config::new(input.path(), output.path()).with_extension("txt");
    let summary = assert_ok!(run(&config));

    assert_eq!(summary.records, 1);
    assert_eq!(read_output(output.path(), "group_g_output.log")[0].id, 2);
}

#[test]
fn buffered_channels_give_the_same_result() {
    let (input, output) = dirs();
    let lines: Vec<String> = (0..200)
        .map(|id| format!("o|{id}|s|c|u|seed|g{}|t", id % 3))
        .collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_log(input.path(), "a.log", &lines);

    let config = Config::new(input.path(), output.path())
        .with_workers(4)
        .with_channel_capacity(32);
    let summary = assert_ok!(run(&config));

    assert_eq!(summary.records, 200);
    assert_eq!(summary.groups, 3);
}

#[test]
fn empty_input_tree_writes_nothing() {
    let (input, output) = dirs();

    let summary = assert_ok!(run(&Config::new(input.path(), output.path())));

    assert_eq!(summary.records, 0);
    assert_eq!(summary.state, PipelineState::Complete);
    assert!(file_names(output.path()).is_empty());
}

#[test]
fn missing_output_directory_is_created() {
    let (input, output) = dirs();
    write_log(input.path(), "a.log", &["a|1|s|c|u|seed|g|t"]);
    let nested_output = output.path().join("not").join("there");

    assert_ok!(run(&Config::new(input.path(), &nested_output)));

    assert_eq!(file_names(&nested_output), vec!["group_g_output.log"]);
}

#[test]
fn missing_input_directory_aborts_the_run() {
    let (input, output) = dirs();

    let result = run(&Config::new(input.path().join("missing"), output.path()));

    assert_matches!(result, Err(Error::DirectoryWalk { .. }));
    assert!(file_names(output.path()).is_empty());
}

#[test]
fn output_path_which_is_a_file_aborts_before_starting() {
    let (input, output) = dirs();
    let blocker = output.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let result = run(&Config::new(input.path(), &blocker));

    assert_matches!(result, Err(Error::OutputDir { .. }));
}

#[test]
fn zero_workers_is_rejected() {
    let (input, output) = dirs();

    let result = run(&Config::new(input.path(), output.path()).with_workers(0));

    assert_matches!(result, Err(Error::InvalidConfig(_)));
}

#[test]
fn rerunning_overwrites_previous_output() {
    let (input, output) = dirs();
    write_log(input.path(), "a.log", &["a|1|s|c|u|seed|g|t", "a|2|s|c|u|seed|g|t"]);
    let config = Config::new(input.path(), output.path());

    assert_ok!(run(&config));
    assert_ok!(run(&config));

    assert_eq!(read_output(output.path(), "group_g_output.log").len(), 2);
}

#[test]
fn thousands_of_files_run_on_a_bounded_set_of_threads() {
    // Arrange
    let (input, output) = dirs();
    let lines: Vec<String> = (0..20)
        .map(|id| format!("x|{id}|s|c|u|seed|g{}|t", id % 2))
        .collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    for file in 0..3000 {
        write_log(input.path(), &format!("f{file}.log"), &lines);
    }
    let config = Config::new(input.path(), output.path()).with_workers(8);

    // Act
    let summary = assert_ok!(run(&config));

    // Assert
    assert_eq!(summary.state, PipelineState::Complete);
    assert_eq!(summary.files, 3000);
    assert_eq!(summary.records, 60_000);
    assert_eq!(read_output(output.path(), "group_g0_output.log").len(), 30_000);
    assert_eq!(read_output(output.path(), "group_g1_output.log").len(), 30_000);
}

#[test]
fn zero_file_tasks_is_rejected() {
    let (input, output) = dirs();
    let config = Config::new(input.path(), output.path()).with_file_tasks(0);

    assert_matches!(run(&config), Err(Error::InvalidConfig(_)));
}
