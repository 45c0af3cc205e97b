pub mod adapter;
pub mod command;
pub mod connection_string;
pub mod dataset;
pub mod parameter;
pub mod reader;
pub mod session;
pub mod value;

pub use adapter::DataAdapter;
pub use command::{Command, CommandType, Statement};
pub use connection_string::{ConnectOptions, OpenMode};
pub use dataset::{DataColumn, DataRow, DataSet, DataTable};
pub use parameter::{DbType, Parameter, ParameterDirection};
pub use reader::DataReader;
pub use session::{ConnectionState, Session};
pub use value::DbValue;
