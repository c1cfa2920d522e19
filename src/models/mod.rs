mod diagnostic;

pub use diagnostic::{
    round2, AggregateRow, DiagnosticRecord, GroupBy, NewDiagnostic, StatisticsSummary,
};
