//! Purchase-order glossary shipped with the engine

/// Korean → Chinese pairs in application order.
///
/// Longer phrases that contain a shorter term come first so the
/// shorter replacement does not split them.
pub(crate) const PURCHASE_ORDER: &[(&str, &str)] = &[
    ("발주서", "订单书"),
    ("수주처", "接单处"),
    ("상호", "商号"),
    ("대표", "代表"),
    ("발주일", "订单日期"),
    ("이메일", "邮箱"),
    ("연락처", "联系方式"),
    ("주소", "地址"),
    ("납기일자", "交货日期"),
    ("발송정보", "配送信息"),
    ("발송일", "发货日"),
    ("품목", "品目"),
    ("단위", "单位"),
    ("수량", "数量"),
    ("구분", "区分"),
    ("비고", "备注"),
    ("합계", "合计"),
    ("요구사항", "要求事项"),
    ("확인", "确认"),
    ("아래와 같이 발주합니다", "订单如下"),
    ("주식회사", "股份有限公司"),
    ("테클라스트코리아", "泰克拉斯特韩国"),
    ("이상모", "李相模"),
    ("등록번호", "注册号码"),
    ("경기도", "京畿道"),
    ("광명시", "光明市"),
    ("하안로", "下安路"),
    ("광명테크노파크", "光明科技园"),
    ("서비스", "服务"),
    ("도소매", "批发零售"),
    ("종목", "种目"),
    ("태블릿PC", "平板电脑"),
    ("유재건부장", "刘在建部长"),
    ("심대용과장", "沈大龙科长"),
    ("반입분", "入库分"),
    ("남품장소", "南品场所"),
    ("남품일정", "南品日程"),
    // General business vocabulary
    ("프로젝트", "项目"),
    ("업무", "业务"),
    ("관리자", "管理员"),
    ("완료", "完成"),
    ("고객", "客户"),
    ("회사", "公司"),
    ("부서", "部门"),
    ("담당자", "负责人"),
    ("직원", "职员"),
    ("팀장", "组长"),
    ("과장", "科长"),
    ("부장", "部长"),
    ("사장", "社长"),
    ("작업", "工作"),
    ("계획", "计划"),
    ("일정", "日程"),
    ("진행", "进行"),
    ("시작", "开始"),
    ("종료", "结束"),
    ("검토", "审查"),
    ("승인", "批准"),
    ("변경", "变更"),
    ("수정", "修改"),
    ("업데이트", "更新"),
    ("품질", "质量"),
    ("성능", "性能"),
    ("정보", "信息"),
    ("데이터", "数据"),
    ("문서", "文件"),
    ("보고서", "报告书"),
    ("제안서", "提案书"),
    ("계획서", "计划书"),
    ("내용", "内容"),
    ("항목", "项"),
    ("목록", "列表"),
    ("설정", "设置"),
    ("상태", "状态"),
    ("결과", "结果"),
    ("목적", "目的"),
    ("목표", "目标"),
    ("방법", "方法"),
    ("절차", "程序"),
    ("과정", "过程"),
    ("단계", "阶段"),
    ("관리", "管理"),
    ("점검", "检查"),
    ("테스트", "测试"),
    ("평가", "评价"),
    ("분석", "分析"),
    ("개발", "开发"),
    ("설계", "设计"),
    ("생산", "生产"),
    ("제조", "制造"),
    ("설치", "安装"),
    ("배송", "配送"),
    ("시스템", "系统"),
    ("장비", "设备"),
    ("제품", "产品"),
    ("모델", "型号"),
    ("종류", "种类"),
    ("크기", "尺寸"),
    ("시간", "时间"),
    ("기간", "期间"),
    ("가격", "价格"),
    ("비용", "费用"),
    ("금액", "金额"),
    ("총계", "总计"),
    ("기본", "基本"),
    ("표준", "标准"),
    ("특별", "特别"),
    ("현재", "现在"),
    ("새로운", "新的"),
    ("최신", "最新"),
];
