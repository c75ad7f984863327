//! # Sinkモデル
//! Sinkモデルには、下記のモデルを実装する
//!
//! - Trajectory（1サンプル1レコードの時系列記録）

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Index;
use std::path::Path;

use anyhow::Context;

use super::super::sim_signal::signal::SigDef;

/// 1サンプル分の記録
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRecord {
    pub time: f64,           // 時刻
    pub process_value: f64,  // プロセス値（update・積分後）
    pub setpoint: f64,       // 目標値
    pub inlet_flow: f64,     // 入口流量
    pub temperature: f64,    // 温度
    pub pressure: f64,       // 圧力
    pub orifice_flow: f64,   // オリフィス流量
    pub control_signal: f64, // 制御出力
}

impl TrajectoryRecord {
    fn values(&self) -> [f64; 8] {
        [
            self.time,
            self.process_value,
            self.setpoint,
            self.inlet_flow,
            self.temperature,
            self.pressure,
            self.orifice_flow,
            self.control_signal,
        ]
    }
}

/// シミュレーション結果の時系列（追記のみ）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    records: Vec<TrajectoryRecord>,
}

impl Trajectory {
    pub fn with_capacity(stepnum: usize) -> Self {
        Self {
            records: Vec::with_capacity(stepnum),
        }
    }

    /// 列定義（信号名と単位）。並びはTrajectoryRecordのフィールド順
    pub fn sigdef() -> Vec<SigDef> {
        crate::MakeSigList![
            ("time", "s"),
            ("process_value", "-"),
            ("setpoint", "-"),
            ("inlet_flow", "-"),
            ("temperature", "degC"),
            ("pressure", "-"),
            ("orifice_flow", "m3/s"),
            ("control_signal", "-"),
        ]
    }

    pub(crate) fn push(&mut self, record: TrajectoryRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[TrajectoryRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TrajectoryRecord> {
        self.records.last()
    }

    /// 信号名を指定して1列分を取り出す
    pub fn column(&self, signame: &str) -> Option<Vec<f64>> {
        let idx = Self::sigdef().iter().position(|sig| sig.name() == signame)?;
        Some(self.records.iter().map(|rec| rec.values()[idx]).collect())
    }

    /// CSV形式で書き出す（1行目は "信号名[単位]" のヘッダ）
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let header = Self::sigdef().iter().map(|sig| sig.to_string()).collect::<Vec<String>>().join(",");
        writeln!(writer, "{}", header)?;

        for rec in self.records.iter() {
            let line = rec.values().iter().map(|v| v.to_string()).collect::<Vec<String>>().join(",");
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    /// CSVファイルへ書き出す
    pub fn export(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Trajectory: ファイルを作成できませんでした。({})", path.display()))?;
        let mut writer = BufWriter::new(file);

        self.write_csv(&mut writer).with_context(|| format!("Trajectory: 書き込みに失敗しました。({})", path.display()))?;
        writer.flush()?;
        Ok(())
    }
}

impl Index<usize> for Trajectory {
    type Output = TrajectoryRecord;
    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryRecord;
    type IntoIter = std::slice::Iter<'a, TrajectoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
